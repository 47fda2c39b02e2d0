//! Composition of weighted functions into one solvable decision problem.

use arbiter_core::{DecisionDomain, Region, WeightedFunction};

use crate::search::{Descent, Incumbent};
use crate::{Result, SolveError};

/// Which per-function maxima seed the incumbent before the descent.
///
/// Seeding costs one point evaluation per function per seed and gives the
/// search a competitive bound early, so pruning starts working from the
/// first subtree instead of the first adopted leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Start cold.
    None,
    /// Seed with the maximal point of the highest-priority function.
    TopPriority,
    /// Also test the maximal point of every other function.
    EveryFunction,
}

/// Tuning knobs for [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Margin a candidate must clear over the incumbent before it is
    /// adopted. Values below zero are treated as zero.
    pub epsilon: f64,
    pub seed: SeedPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.0,
            seed: SeedPolicy::EveryFunction,
        }
    }
}

/// The decision a solved problem produced: the winning composite region,
/// its summed weight, and the domain needed to express the winning point
/// as continuous variable settings.
#[derive(Debug, Clone)]
pub struct Solution {
    region: Region,
    weight: f64,
    domain: DecisionDomain,
}

impl Solution {
    /// Summed weight of every function at the winning point.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The composite region the winning point was drawn from.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The winning point itself.
    pub fn point(&self) -> Region {
        self.region.max_point()
    }

    /// Continuous value of the winning point for the named variable.
    pub fn value(&self, var: &str) -> Option<f64> {
        let ix = self.domain.index_of(var)?;
        let step = self.point().span(ix).lo();
        self.domain.value_at(ix, step as usize)
    }
}

/// A multi-objective decision problem: weighted functions over one shared
/// domain, an incumbent candidate, and the search configuration.
///
/// Functions are owned by value. The expected cycle is [`add_function`]
/// for each behavior, one [`align_functions`], one [`solve`], then either
/// dropping the problem or [`clear`]ing it for the next decision round.
///
/// [`add_function`]: Problem::add_function
/// [`align_functions`]: Problem::align_functions
/// [`solve`]: Problem::solve
/// [`clear`]: Problem::clear
#[derive(Debug, Clone)]
pub struct Problem {
    domain: DecisionDomain,
    functions: Vec<WeightedFunction>,
    config: SolverConfig,
    best: Incumbent,
}

impl Problem {
    pub fn new(domain: DecisionDomain) -> Self {
        Self {
            domain,
            functions: Vec::new(),
            config: SolverConfig::default(),
            best: None,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    pub fn domain(&self) -> &DecisionDomain {
        &self.domain
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn function(&self, ix: usize) -> Option<&WeightedFunction> {
        self.functions.get(ix)
    }

    pub fn dim(&self) -> usize {
        self.domain.size()
    }

    /// Admits a function into the problem. Returns false, leaving the
    /// problem untouched, when the priority is not positive.
    ///
    /// On intake the function's range is normalized to `[0, 100]` if it
    /// exceeds 100, bounding any one function's contribution before
    /// weighting, and the priority is then baked into the polynomial
    /// weights and grid bounds.
    pub fn add_function(&mut self, mut function: WeightedFunction) -> bool {
        let priority = function.priority();
        if priority <= 0.0 {
            return false;
        }
        let map = function.map_mut();
        if map.max_weight() - map.min_weight() > 100.0 {
            map.normalize(0.0, 100.0);
        }
        map.apply_weight(priority);
        self.functions.push(function);
        true
    }

    /// Re-expresses every function over the problem domain, matching
    /// variables by name. A function using a variable the domain does not
    /// carry rejects the whole cycle, since a partially aligned aggregate
    /// is worse than no decision.
    pub fn align_functions(&mut self) -> Result<()> {
        for f in &mut self.functions {
            if f.align_to(&self.domain) {
                continue;
            }
            let missing = (0..f.dim())
                .filter_map(|d| f.var_name(d))
                .find(|v| !self.domain.has_var(v))
                .unwrap_or_default()
                .to_string();
            return Err(SolveError::MissingVariable {
                context: f.context().to_string(),
                var: missing,
            });
        }
        debug_assert!(
            self.functions_in_sync(),
            "functions disagree on axes after alignment"
        );
        Ok(())
    }

    /// Reorders the functions by priority, highest first, so the descent
    /// branches on the most influential function at the top level.
    pub fn sort_functions(&mut self) {
        self.functions
            .sort_by(|a, b| b.priority().total_cmp(&a.priority()));
    }

    /// Seeds the incumbent with the maximal point of the highest-priority
    /// function's grid. Functions without a built grid are skipped.
    pub fn seed_top_priority(&mut self) {
        if self.functions.is_empty() {
            return;
        }
        let mut top = 0;
        for i in 1..self.functions.len() {
            if self.functions[i].priority() > self.functions[top].priority() {
                top = i;
            }
        }
        if let Some(point) = self.grid_max_point(top) {
            self.try_candidate(&point);
        }
    }

    /// Seeds the incumbent with the maximal point of every function after
    /// the first, each evaluated against the sum of all functions.
    pub fn seed_remaining_functions(&mut self) {
        let points: Vec<Region> = (1..self.functions.len())
            .filter_map(|ix| self.grid_max_point(ix))
            .collect();
        for point in points {
            self.try_candidate(&point);
        }
    }

    /// Sums every function at a candidate point and adopts it as the
    /// incumbent when the point is fully covered and the sum beats the
    /// incumbent by more than epsilon. Returns true on adoption.
    pub fn try_candidate(&mut self, point: &Region) -> bool {
        if !point.is_point() {
            return false;
        }
        let mut weight = 0.0;
        for f in &self.functions {
            // A point any one function leaves uncovered is infeasible.
            match f.map().eval_point(point) {
                Some(v) => weight += v,
                None => return false,
            }
        }
        let epsilon = self.epsilon();
        match &self.best {
            Some((_, incumbent)) if weight <= incumbent + epsilon => false,
            _ => {
                self.best = Some((point.clone(), weight));
                true
            }
        }
    }

    /// Solves the problem cold. See [`Problem::solve_from`].
    pub fn solve(&mut self) -> Result<Solution> {
        self.solve_from(None)
    }

    /// Finds the domain point maximizing the sum of the functions.
    ///
    /// The previous incumbent is discarded: each solve starts from the
    /// optional warm-start point, the configured seeds, and then the full
    /// branch-and-bound descent, so repeated solves on one problem cannot
    /// leak state between cycles. Every function is given a grid first if
    /// it lacks one.
    pub fn solve_from(&mut self, warm: Option<&Region>) -> Result<Solution> {
        if self.functions.is_empty() {
            return Err(SolveError::NoFunctions);
        }
        let epsilon = self.epsilon();
        tracing::debug!(
            functions = self.functions.len(),
            epsilon,
            "solving decision problem"
        );

        for f in &mut self.functions {
            if f.map().grid().is_none() {
                f.map_mut().rebuild_grid(true, true);
            }
        }

        self.best = None;
        if let Some(point) = warm {
            self.try_candidate(point);
        }
        match self.config.seed {
            SeedPolicy::None => {}
            SeedPolicy::TopPriority => self.seed_top_priority(),
            SeedPolicy::EveryFunction => {
                self.seed_top_priority();
                self.seed_remaining_functions();
            }
        }

        Descent::new(&self.functions, epsilon).run(&mut self.best);

        let Some((region, weight)) = self.best.clone() else {
            return Err(SolveError::Infeasible);
        };
        tracing::debug!(weight, "decision adopted");
        Ok(Solution {
            region,
            weight,
            domain: self.domain.clone(),
        })
    }

    /// Continuous value of the current incumbent for the named variable.
    /// `None` until a solve or candidate has produced an incumbent, or
    /// when the variable is not in the domain.
    pub fn result_for(&self, var: &str) -> Option<f64> {
        let (region, _) = self.best.as_ref()?;
        let ix = self.domain.index_of(var)?;
        let step = region.max_point().span(ix).lo();
        self.domain.value_at(ix, step as usize)
    }

    /// Summed weight of the current incumbent, if any.
    pub fn best_weight(&self) -> Option<f64> {
        self.best.as_ref().map(|(_, w)| *w)
    }

    /// Mean piece count across the functions, a load indicator for
    /// telemetry. Zero for an empty problem.
    pub fn piece_avg(&self) -> f64 {
        if self.functions.is_empty() {
            return 0.0;
        }
        let total: usize = self.functions.iter().map(WeightedFunction::size).sum();
        total as f64 / self.functions.len() as f64
    }

    /// Drops every function and the incumbent, keeping the domain and
    /// configuration for the next decision cycle.
    pub fn clear(&mut self) {
        self.functions.clear();
        self.best = None;
    }

    /// Releases the functions back to the caller.
    pub fn into_functions(self) -> Vec<WeightedFunction> {
        self.functions
    }

    fn epsilon(&self) -> f64 {
        self.config.epsilon.max(0.0)
    }

    fn grid_max_point(&self, ix: usize) -> Option<Region> {
        let grid = self.functions[ix].map().grid()?;
        if grid.is_empty() {
            return None;
        }
        grid.max_point().cloned()
    }

    fn functions_in_sync(&self) -> bool {
        self.functions.iter().all(|f| {
            f.dim() == self.domain.size()
                && (0..f.dim()).all(|d| f.var_name(d) == self.domain.var_name(d))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::PiecewiseMap;

    fn steps_domain() -> DecisionDomain {
        let mut dom = DecisionDomain::new();
        assert!(dom.add_var("x", 0.0, 10.0, 11));
        dom
    }

    fn flat_function(dom: &DecisionDomain, value: f64) -> WeightedFunction {
        let mut piece = Region::new(1, 1);
        piece.set_span(0, 0, dom.var_points(0) as i32 - 1);
        piece.set_weights(&[0.0, value]);
        let mut map = PiecewiseMap::new(dom.clone(), 1, vec![piece]).expect("valid map");
        map.rebuild_grid(true, true);
        WeightedFunction::new(map)
    }

    #[test]
    fn zero_priority_function_is_rejected() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone());
        assert!(!problem.add_function(flat_function(&dom, 5.0).with_priority(0.0)));
        assert_eq!(problem.function_count(), 0);
        assert!(problem.add_function(flat_function(&dom, 5.0)));
        assert_eq!(problem.function_count(), 1);
    }

    #[test]
    fn intake_normalizes_only_wide_ranges() {
        let dom = steps_domain();

        let mut narrow = Region::new(1, 1);
        narrow.set_span(0, 0, 10);
        narrow.set_weights(&[8.0, 0.0]); // range 80, untouched
        let map = PiecewiseMap::new(dom.clone(), 1, vec![narrow]).expect("valid map");
        let mut problem = Problem::new(dom.clone());
        assert!(problem.add_function(WeightedFunction::new(map)));
        let taken = problem.function(0).expect("added");
        assert_eq!(taken.map().max_weight(), 80.0);

        let mut wide = Region::new(1, 1);
        wide.set_span(0, 0, 10);
        wide.set_weights(&[20.0, 0.0]); // range 200, squeezed to [0, 100]
        let map = PiecewiseMap::new(dom.clone(), 1, vec![wide]).expect("valid map");
        assert!(problem.add_function(WeightedFunction::new(map).with_priority(2.0)));
        let taken = problem.function(1).expect("added");
        // Normalized to [0, 100], then the priority is baked in.
        assert!((taken.map().max_weight() - 200.0).abs() < 1e-9);
        assert!((taken.map().min_weight() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn sort_orders_by_priority_descending() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone());
        problem.add_function(flat_function(&dom, 1.0).with_priority(2.0));
        problem.add_function(flat_function(&dom, 1.0).with_priority(9.0));
        problem.add_function(flat_function(&dom, 1.0).with_priority(4.0));
        problem.sort_functions();
        let order: Vec<f64> = (0..3)
            .map(|i| problem.function(i).expect("present").priority())
            .collect();
        assert_eq!(order, vec![9.0, 4.0, 2.0]);
    }

    #[test]
    fn candidate_gate_applies_epsilon() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone()).with_config(SolverConfig {
            epsilon: 1.0,
            seed: SeedPolicy::None,
        });
        problem.add_function(flat_function(&dom, 5.0));

        assert!(problem.try_candidate(&Region::point_at(&[3])));
        assert_eq!(problem.best_weight(), Some(5.0));
        // Same weight again: inside the margin, not adopted.
        assert!(!problem.try_candidate(&Region::point_at(&[7])));
        // A non-point region is never a candidate.
        let mut wide = Region::new(1, 0);
        wide.set_span(0, 2, 4);
        assert!(!problem.try_candidate(&wide));
    }

    #[test]
    fn negative_epsilon_acts_as_zero() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone()).with_config(SolverConfig {
            epsilon: -3.0,
            seed: SeedPolicy::None,
        });
        problem.add_function(flat_function(&dom, 5.0));
        assert!(problem.try_candidate(&Region::point_at(&[3])));
        // With epsilon clamped to zero an equal candidate still loses.
        assert!(!problem.try_candidate(&Region::point_at(&[4])));
    }

    #[test]
    fn result_for_requires_an_incumbent() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone());
        problem.add_function(flat_function(&dom, 5.0));
        assert_eq!(problem.result_for("x"), None);
        assert_eq!(problem.best_weight(), None);

        problem.try_candidate(&Region::point_at(&[4]));
        assert_eq!(problem.result_for("x"), Some(4.0));
        assert_eq!(problem.result_for("y"), None);
    }

    #[test]
    fn clear_keeps_domain_and_config() {
        let dom = steps_domain();
        let config = SolverConfig {
            epsilon: 0.5,
            seed: SeedPolicy::TopPriority,
        };
        let mut problem = Problem::new(dom.clone()).with_config(config);
        problem.add_function(flat_function(&dom, 5.0));
        problem.try_candidate(&Region::point_at(&[1]));
        problem.clear();
        assert_eq!(problem.function_count(), 0);
        assert_eq!(problem.best_weight(), None);
        assert_eq!(problem.config(), config);
        assert_eq!(problem.dim(), 1);
    }

    #[test]
    fn piece_avg_measures_function_load() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone());
        assert_eq!(problem.piece_avg(), 0.0);
        problem.add_function(flat_function(&dom, 5.0));
        let mut two = Vec::new();
        for (lo, hi) in [(0, 5), (6, 10)] {
            let mut r = Region::new(1, 1);
            r.set_span(0, lo, hi);
            r.set_weights(&[0.0, 1.0]);
            two.push(r);
        }
        let map = PiecewiseMap::new(dom.clone(), 1, two).expect("valid map");
        problem.add_function(WeightedFunction::new(map));
        assert_eq!(problem.piece_avg(), 1.5);
    }

    #[test]
    fn into_functions_releases_ownership() {
        let dom = steps_domain();
        let mut problem = Problem::new(dom.clone());
        problem.add_function(flat_function(&dom, 5.0).with_context("keeper"));
        let functions = problem.into_functions();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].context(), "keeper");
    }
}
