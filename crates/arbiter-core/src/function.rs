use crate::{DecisionDomain, PiecewiseMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piecewise map paired with the priority weight and context label a
/// behavior attached to it. The priority is never negative; attempts to
/// set a negative weight are ignored.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedFunction {
    map: PiecewiseMap,
    priority: f64,
    context: String,
}

impl WeightedFunction {
    pub fn new(map: PiecewiseMap) -> Self {
        Self {
            map,
            priority: 1.0,
            context: String::new(),
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.set_priority(priority);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Ignores negative values.
    pub fn set_priority(&mut self, priority: f64) {
        if priority >= 0.0 {
            self.priority = priority;
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    pub fn map(&self) -> &PiecewiseMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut PiecewiseMap {
        &mut self.map
    }

    pub fn into_map(self) -> PiecewiseMap {
        self.map
    }

    /// Number of pieces in the underlying map.
    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn dim(&self) -> usize {
        self.map.dim()
    }

    pub fn var_name(&self, d: usize) -> Option<&str> {
        self.map.domain().var_name(d)
    }

    /// Re-expresses the function over `target`, matching variables by
    /// name. Identity when the domains already agree; fails when some
    /// variable of this function is absent from `target`.
    pub fn align_to(&mut self, target: &DecisionDomain) -> bool {
        if self.map.domain() == target {
            return true;
        }
        let of_dim = self.map.dim();
        if of_dim > target.size() {
            return false;
        }
        let mut placement = Vec::with_capacity(of_dim);
        for d in 0..of_dim {
            let Some(name) = self.map.domain().var_name(d) else {
                return false;
            };
            let Some(ix) = target.index_of(name) else {
                return false;
            };
            placement.push(ix);
        }
        self.map.remap_domain(target, &placement)
    }
}
