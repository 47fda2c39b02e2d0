//! Builds a one-variable piecewise function from sparse utility samples.

use arbiter_core::{DecisionDomain, PiecewiseMap, Region, Snap, WeightedFunction};
use tracing::warn;

use crate::{sub_domain, BuildError, Result};

/// Turns a sparse list of `(domain value, utility)` samples into a
/// degree-1 [`WeightedFunction`] over a single decision variable.
///
/// The pipeline: sort samples by domain value if out of order, quantize
/// each value to its nearest discrete index (out-of-range samples clamp to
/// the edge with a warning), extend the curve to the first and last index
/// by repeating the nearest known utility, average samples landing on the
/// same index, then emit one linear piece per consecutive index pair.
/// Pieces after the first start one index late so the pieces tile the
/// domain without overlap.
///
/// Warnings accumulate on the builder and are logged on build; only
/// structural problems fail the build.
#[derive(Debug, Clone)]
pub struct VectorBuilder {
    domain: DecisionDomain,
    domain_ok: bool,
    var: String,
    samples: Vec<f64>,
    utilities: Vec<f64>,
    range_hint: Option<(f64, f64)>,
    sort_needed: bool,
    config_warnings: Vec<String>,
    build_warnings: Vec<String>,
}

impl VectorBuilder {
    /// Targets one variable of the given domain. The variable must exist
    /// and have a positive step; violations surface on [`build`].
    ///
    /// [`build`]: VectorBuilder::build
    pub fn new(domain: &DecisionDomain, var: &str) -> Self {
        let sub = sub_domain(domain, &[var]);
        let domain_ok = sub.size() == 1 && sub.var_delta(0) > 0.0;
        Self {
            domain: sub,
            domain_ok,
            var: var.to_string(),
            samples: Vec::new(),
            utilities: Vec::new(),
            range_hint: None,
            sort_needed: false,
            config_warnings: Vec::new(),
            build_warnings: Vec::new(),
        }
    }

    /// Sets the domain values of the samples. An empty slice is ignored.
    /// Out-of-range values are kept but flagged; quantization clamps them.
    pub fn with_samples(mut self, vals: &[f64]) -> Self {
        if vals.is_empty() {
            return self;
        }
        let low = self.domain.var_low(0);
        let high = self.domain.var_high(0);

        let mut out_of_range = false;
        let mut prev = f64::NEG_INFINITY;
        self.sort_needed = false;
        for &v in vals {
            if v < low || v > high {
                out_of_range = true;
            }
            let clamped = v.clamp(low, high);
            if clamped < prev {
                self.sort_needed = true;
            }
            prev = clamped;
        }
        if out_of_range {
            self.config_warnings
                .push(format!("domain samples outside [{low}, {high}]"));
        }

        self.samples = vals.to_vec();
        self
    }

    /// Sets the utility value of each sample, in sample order.
    pub fn with_utilities(mut self, vals: &[f64]) -> Self {
        self.utilities = vals.to_vec();
        self
    }

    /// Declares the expected utility range. Checked on build; a hint with
    /// `low > high` fails the build.
    pub fn with_utility_range(mut self, low: f64, high: f64) -> Self {
        self.range_hint = Some((low, high));
        self
    }

    /// Lowest utility: the hint if one was given, else the smallest sample.
    /// Zero while no utilities are set.
    pub fn min_util(&self) -> f64 {
        match self.range_hint {
            Some((low, _)) => low,
            None => self
                .utilities
                .iter()
                .copied()
                .reduce(f64::min)
                .unwrap_or(0.0),
        }
    }

    /// Highest utility: the hint if one was given, else the largest sample.
    /// Zero while no utilities are set.
    pub fn max_util(&self) -> f64 {
        match self.range_hint {
            Some((_, high)) => high,
            None => self
                .utilities
                .iter()
                .copied()
                .reduce(f64::max)
                .unwrap_or(0.0),
        }
    }

    /// Warnings gathered so far, configuration first.
    pub fn warnings(&self) -> Vec<&str> {
        self.config_warnings
            .iter()
            .chain(&self.build_warnings)
            .map(String::as_str)
            .collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.config_warnings.is_empty() || !self.build_warnings.is_empty()
    }

    /// Builds the function. The builder keeps its configuration and
    /// warnings, so a build may be repeated after adjusting inputs.
    pub fn build(&mut self) -> Result<WeightedFunction> {
        self.build_warnings.clear();

        if !self.domain_ok {
            return Err(BuildError::BadDomain(self.var.clone()));
        }
        if self.samples.len() != self.utilities.len() {
            return Err(BuildError::LengthMismatch {
                domain: self.samples.len(),
                utility: self.utilities.len(),
            });
        }
        if let Some((low, high)) = self.range_hint {
            if low > high {
                return Err(BuildError::InvalidUtilityRange { low, high });
            }
        }

        let mut pairs: Vec<(f64, f64)> = self
            .samples
            .iter()
            .copied()
            .zip(self.utilities.iter().copied())
            .collect();
        if self.sort_needed {
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        let indexed = self.quantize(&pairs);
        let curve = collapse(indexed);
        if curve.len() < 2 {
            self.log_warnings();
            return Err(BuildError::TooFewSamples);
        }

        let mut pieces = Vec::with_capacity(curve.len() - 1);
        for window in curve.windows(2) {
            let (ix_lo, val_lo) = window[0];
            let (ix_hi, val_hi) = window[1];
            let run = f64::from(ix_hi - ix_lo);
            let slope = if run > 0.0 {
                (val_hi - val_lo) / run
            } else {
                0.0
            };
            let intercept = val_lo - slope * f64::from(ix_lo);

            let mut piece = Region::new(1, 1);
            // Later pieces yield their shared boundary index to the earlier
            // piece so the tiling stays disjoint.
            let lo = if pieces.is_empty() { ix_lo } else { ix_lo + 1 };
            piece.set_span(0, lo, ix_hi);
            piece.set_weights(&[slope, intercept]);
            pieces.push(piece);
        }

        let Some(mut map) = PiecewiseMap::new(self.domain.clone(), 1, pieces) else {
            return Err(BuildError::BadDomain(self.var.clone()));
        };
        map.rebuild_grid(true, true);

        self.log_warnings();
        Ok(WeightedFunction::new(map))
    }

    /// Maps raw samples onto discrete indices, warning when several raw
    /// values land on one index or the curve misses a domain edge.
    fn quantize(&mut self, pairs: &[(f64, f64)]) -> Vec<(i32, f64)> {
        let points = self.domain.var_points(0);
        let mut indexed: Vec<(i32, f64)> = Vec::with_capacity(pairs.len() + 2);

        let mut overlap = false;
        for &(val, util) in pairs {
            let ix = self.domain.discrete_index(0, val, Snap::Nearest) as i32;
            if indexed.last().is_some_and(|&(prev, _)| prev == ix) {
                overlap = true;
            }
            indexed.push((ix, util));
        }
        if overlap {
            self.build_warnings
                .push("several samples map to one domain index".to_string());
        }

        if let (Some(&(first_ix, first_util)), Some(&(last_ix, last_util))) =
            (indexed.first(), indexed.last())
        {
            if first_ix != 0 {
                self.build_warnings
                    .push("curve does not reach the lower domain edge".to_string());
                indexed.insert(0, (0, first_util));
            }
            let last = points as i32 - 1;
            if last_ix != last {
                self.build_warnings
                    .push("curve does not reach the upper domain edge".to_string());
                indexed.push((last, last_util));
            }
        }
        indexed
    }

    fn log_warnings(&self) {
        for w in self.config_warnings.iter().chain(&self.build_warnings) {
            warn!(var = %self.var, "{w}");
        }
    }
}

/// Averages runs of samples sharing a discrete index. Input is sorted by
/// index, so runs are consecutive.
fn collapse(indexed: Vec<(i32, f64)>) -> Vec<(i32, f64)> {
    let mut out: Vec<(i32, f64)> = Vec::with_capacity(indexed.len());
    let mut run_len = 0usize;
    for (ix, util) in indexed {
        match out.last_mut() {
            Some(last) if last.0 == ix => {
                run_len += 1;
                last.1 += (util - last.1) / run_len as f64;
            }
            _ => {
                run_len = 1;
                out.push((ix, util));
            }
        }
    }
    out
}
