#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rounding policy when mapping a continuous value onto a discrete step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Snap {
    Floor,
    Ceil,
    /// Rounds to the nearest step; exact midpoints resolve to the lower
    /// step.
    Nearest,
}

/// One decision variable: a closed continuous range sampled at evenly
/// spaced points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DomainVar {
    name: String,
    low: f64,
    high: f64,
    points: usize,
    delta: f64,
}

impl DomainVar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn points(&self) -> usize {
        self.points
    }

    /// Spacing between adjacent points. Zero for single-point variables.
    pub fn delta(&self) -> f64 {
        self.delta
    }
}

/// An ordered set of named decision variables defining the discretized
/// space that regions, maps, and problems operate over.
///
/// Variables are indexed in insertion order. Two domains compare equal
/// when their variables match in order, name, range, and resolution.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecisionDomain {
    vars: Vec<DomainVar>,
}

impl DecisionDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable. Returns false, leaving the domain untouched, when
    /// the name is already present, `low > high`, `points` is zero, or a
    /// single-point variable has a nonzero extent.
    pub fn add_var(&mut self, name: &str, low: f64, high: f64, points: usize) -> bool {
        if self.has_var(name) {
            return false;
        }
        if low > high || points < 1 {
            return false;
        }
        if points == 1 && low != high {
            return false;
        }
        let delta = if points > 1 {
            (high - low) / (points - 1) as f64
        } else {
            0.0
        };
        self.vars.push(DomainVar {
            name: name.to_string(),
            low,
            high,
            points,
            delta,
        });
        true
    }

    /// Copies one variable out of another domain.
    pub fn add_var_from(&mut self, other: &DecisionDomain, name: &str) -> bool {
        let Some(var) = other.var_by_name(name) else {
            return false;
        };
        let var = var.clone();
        self.add_var(&var.name, var.low, var.high, var.points)
    }

    pub fn size(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// True when every variable is named by one of the two arguments.
    pub fn has_only(&self, v1: &str, v2: Option<&str>) -> bool {
        self.vars
            .iter()
            .all(|v| v.name == v1 || v2.is_some_and(|n| v.name == n))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    pub fn var(&self, ix: usize) -> Option<&DomainVar> {
        self.vars.get(ix)
    }

    pub fn var_by_name(&self, name: &str) -> Option<&DomainVar> {
        self.index_of(name).and_then(|ix| self.var(ix))
    }

    pub fn var_name(&self, ix: usize) -> Option<&str> {
        self.var(ix).map(|v| v.name.as_str())
    }

    /// Point count of the variable at `ix`, or 0 when out of range.
    pub fn var_points(&self, ix: usize) -> usize {
        self.var(ix).map(|v| v.points).unwrap_or(0)
    }

    pub fn var_delta(&self, ix: usize) -> f64 {
        self.var(ix).map(|v| v.delta).unwrap_or(0.0)
    }

    pub fn var_low(&self, ix: usize) -> f64 {
        self.var(ix).map(|v| v.low).unwrap_or(0.0)
    }

    pub fn var_high(&self, ix: usize) -> f64 {
        self.var(ix).map(|v| v.high).unwrap_or(0.0)
    }

    /// Product of the point counts over all variables.
    pub fn total_points(&self) -> usize {
        self.vars.iter().map(|v| v.points).product()
    }

    /// Continuous value of discrete step `step` along variable `ix`.
    pub fn value_at(&self, ix: usize, step: usize) -> Option<f64> {
        let var = self.var(ix)?;
        if step >= var.points {
            return None;
        }
        Some(var.low + var.delta * step as f64)
    }

    /// Discrete step closest to `val` under the given snap policy.
    /// Values at or beyond the range clamp to the first or last step.
    pub fn discrete_index(&self, ix: usize, val: f64, snap: Snap) -> usize {
        debug_assert!(ix < self.size(), "variable index out of range");
        let Some(var) = self.var(ix) else {
            return 0;
        };
        if val <= var.low {
            return 0;
        }
        if val >= var.high {
            return var.points - 1;
        }
        match snap {
            Snap::Floor => ((val - var.low) / var.delta) as usize,
            Snap::Ceil | Snap::Nearest => {
                let mut val = val;
                if snap == Snap::Nearest {
                    val -= var.delta / 2.0;
                }
                let dval = (val - var.low) / var.delta;
                if dval <= 0.0 {
                    return 0;
                }
                let mut ival = dval as usize;
                if dval > ival as f64 {
                    ival += 1;
                }
                ival
            }
        }
    }
}
