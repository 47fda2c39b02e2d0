//! Builds a threshold-shaped utility curve over one decision variable.

use arbiter_core::{DecisionDomain, PiecewiseMap, Region, WeightedFunction};
use tracing::warn;

use crate::{sub_domain, BuildError, Result};

/// Full utility at or below a threshold, a linear falloff across the base
/// width, low utility beyond:
///
/// ```text
/// high |--------o
///      |          \
///      |            \
///  low |              o----------
///      +---------|----|----------
///            threshold|
///                     threshold + base_width
/// ```
///
/// An optional summit bonus lifts the single index at the threshold above
/// the plateau, and a tie-break slope tilts the flat pieces slightly so
/// otherwise-equal decisions order deterministically. Emits at most four
/// degree-1 pieces covering every index of the variable.
#[derive(Debug, Clone)]
pub struct ThresholdBuilder {
    domain: DecisionDomain,
    domain_ok: bool,
    var: String,
    threshold: f64,
    base_width: f64,
    summit_delta: f64,
    min_util: f64,
    max_util: f64,
    tie_break: f64,
    warnings: Vec<String>,
}

impl ThresholdBuilder {
    /// Targets one variable of the given domain. The variable must exist
    /// and have a positive step; violations surface on [`build`].
    ///
    /// [`build`]: ThresholdBuilder::build
    pub fn new(domain: &DecisionDomain, var: &str) -> Self {
        let sub = sub_domain(domain, &[var]);
        let domain_ok = sub.size() == 1 && sub.var_delta(0) > 0.0;
        Self {
            domain: sub,
            domain_ok,
            var: var.to_string(),
            threshold: 0.0,
            base_width: 0.0,
            summit_delta: 0.0,
            min_util: 0.0,
            max_util: 100.0,
            tie_break: 0.0,
            warnings: Vec::new(),
        }
    }

    /// Domain value at which utility starts dropping. A threshold outside
    /// the variable range is kept but flagged as suspicious.
    pub fn with_threshold(mut self, value: f64) -> Self {
        self.threshold = value;
        if self.domain_ok
            && (value < self.domain.var_low(0) || value > self.domain.var_high(0))
        {
            self.warnings
                .push(format!("threshold {value} outside the domain range"));
        }
        self
    }

    /// Width, in domain units, of the falloff from high to low utility.
    /// Negative widths fail the build.
    pub fn with_base_width(mut self, width: f64) -> Self {
        self.base_width = width;
        self
    }

    /// Bonus utility on the threshold index itself. Negative values clamp
    /// to zero.
    pub fn with_summit_delta(mut self, delta: f64) -> Self {
        self.summit_delta = delta.max(0.0);
        self
    }

    /// Low and high utility of the curve. Defaults to `0` and `100`; the
    /// build fails unless `low < high`.
    pub fn with_utility_range(mut self, low: f64, high: f64) -> Self {
        self.min_util = low;
        self.max_util = high;
        self
    }

    /// Slope added to the plateau and subtracted from the tail, nudging
    /// ties toward the threshold from both sides.
    pub fn with_tie_break(mut self, slope: f64) -> Self {
        self.tie_break = slope;
        self
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Builds the function. The builder keeps its configuration, so a
    /// build may be repeated after adjusting inputs.
    pub fn build(&mut self) -> Result<WeightedFunction> {
        if !self.domain_ok {
            return Err(BuildError::BadDomain(self.var.clone()));
        }
        if self.base_width < 0.0 {
            return Err(BuildError::NegativeBaseWidth(self.base_width));
        }
        if self.min_util >= self.max_util {
            return Err(BuildError::InvalidUtilityRange {
                low: self.min_util,
                high: self.max_util,
            });
        }

        let low = self.domain.var_low(0);
        let delta = self.domain.var_delta(0);
        let high_ix = self.domain.var_points(0) as i32 - 1;

        let nearest = |value: f64| ((value - low) / delta + 0.5).floor() as i32;
        let raw_one = nearest(self.threshold);
        let ipt_two = nearest(self.threshold + self.base_width).clamp(0, high_ix);
        let ipt_one = raw_one.clamp(0, high_ix).min(ipt_two);
        // Falloff run in index units, from the configured width rather than
        // the clamped interval, so the slope matches the continuous shape.
        let run_cells = ((self.base_width / delta) + 0.5).floor() as i32;

        let has_falloff = ipt_one < ipt_two;
        // The lower edge belongs to the plateau unless the threshold sits
        // below the domain or the falloff already starts there.
        let has_plateau = ipt_one > 0 || (raw_one >= 0 && !has_falloff);

        let mut pieces: Vec<Region> = Vec::with_capacity(4);

        if has_plateau {
            let mut plateau = Region::new(1, 1);
            plateau.set_span(0, 0, ipt_one);
            plateau.set_weights(&[self.tie_break, self.max_util]);
            pieces.push(plateau);
        }

        if self.summit_delta > 0.0 && ipt_one > 1 {
            // The summit index is reclaimed from the plateau.
            if let Some(plateau) = pieces.first_mut() {
                plateau.set_span(0, 0, ipt_one - 1);
            }
            let mut summit = Region::new(1, 1);
            summit.set_span(0, ipt_one, ipt_one);
            summit.set_weights(&[0.0, self.max_util + self.summit_delta]);
            pieces.push(summit);
        }

        if has_falloff {
            let run = f64::from(run_cells.max(1));
            let slope = -(self.max_util - self.min_util) / run;
            let intercept = if has_plateau {
                self.max_util - slope * f64::from(ipt_one)
            } else {
                self.min_util - slope * f64::from(ipt_two)
            };
            let mut falloff = Region::new(1, 1);
            let lo = if has_plateau { ipt_one + 1 } else { ipt_one };
            falloff.set_span(0, lo, ipt_two);
            falloff.set_weights(&[slope, intercept]);
            pieces.push(falloff);
        }

        if ipt_two < high_ix {
            let mut tail = Region::new(1, 1);
            // A shape entirely below the domain leaves the tail to carry
            // the lower edge as well.
            let lo = if has_plateau || has_falloff {
                ipt_two + 1
            } else {
                0
            };
            tail.set_span(0, lo, high_ix);
            tail.set_weights(&[-self.tie_break, self.min_util]);
            pieces.push(tail);
        }

        let Some(mut map) = PiecewiseMap::new(self.domain.clone(), 1, pieces) else {
            return Err(BuildError::BadDomain(self.var.clone()));
        };
        map.rebuild_grid(true, true);

        for w in &self.warnings {
            warn!(var = %self.var, "{w}");
        }
        Ok(WeightedFunction::new(map))
    }
}
