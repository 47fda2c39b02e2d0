//! Branch-and-bound descent over the composed functions.

use arbiter_core::{Region, WeightedFunction};

/// Best composite region found so far and its summed weight.
pub(crate) type Incumbent = Option<(Region, f64)>;

/// Depth-first walk over the cross product of one piece per function.
///
/// A node at level `k` is the running intersection of one piece from each
/// of the first `k` functions, weight vectors summed, so its polynomial is
/// the partial sum of the composed function over the node's extent. A
/// subtree is pruned when an optimistic bound on its completion cannot
/// beat the incumbent by more than `epsilon`; a node reaching the last
/// level is a fully covered candidate and its maximum competes directly.
#[derive(Debug)]
pub(crate) struct Descent<'a> {
    functions: &'a [WeightedFunction],
    epsilon: f64,
}

impl<'a> Descent<'a> {
    pub(crate) fn new(functions: &'a [WeightedFunction], epsilon: f64) -> Self {
        Self { functions, epsilon }
    }

    /// Runs the search, tightening `best` in place.
    pub(crate) fn run(&self, best: &mut Incumbent) {
        let Some(first) = self.functions.first() else {
            return;
        };
        for piece in first.map().regions() {
            if self.worth_exploring(1, piece, best) {
                self.recurse(1, piece.clone(), best);
            }
        }
    }

    fn recurse(&self, level: usize, node: Region, best: &mut Incumbent) {
        if level == self.functions.len() {
            let weight = node.max_val();
            if improves(weight, best, self.epsilon) {
                *best = Some((node, weight));
            }
            return;
        }

        let map = self.functions[level].map();
        let hits = map.query(&node);
        for handle in hits.iter() {
            let Some(piece) = map.region(handle) else {
                continue;
            };
            let Some(next) = node.intersection(piece) else {
                continue;
            };
            if self.worth_exploring(level + 1, &next, best) {
                self.recurse(level + 1, next, best);
            }
        }
    }

    /// Optimistic completion bound: the node's own maximum plus every
    /// deeper function's cached grid bound over the node's extent. A
    /// function with no pieces over the node contributes negative
    /// infinity, so nodes that cannot be fully covered prune immediately.
    fn upper_bound(&self, level: usize, node: &Region) -> f64 {
        let mut bound = node.max_val();
        for f in &self.functions[level..] {
            bound += match f.map().grid() {
                Some(grid) => grid.cheap_bound(Some(node)),
                // Solving builds grids up front; still a valid bound.
                None => f.map().max_weight(),
            };
        }
        bound
    }

    fn worth_exploring(&self, level: usize, node: &Region, best: &Incumbent) -> bool {
        match best {
            None => true,
            Some((_, weight)) => self.upper_bound(level, node) > weight + self.epsilon,
        }
    }
}

fn improves(weight: f64, best: &Incumbent, epsilon: f64) -> bool {
    match best {
        None => true,
        Some((_, incumbent)) => weight > incumbent + epsilon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::{DecisionDomain, PiecewiseMap, Region};

    fn ramp(lo: i32, hi: i32, slope: f64, intercept: f64) -> Region {
        let mut r = Region::new(1, 1);
        r.set_span(0, lo, hi);
        r.set_weights(&[slope, intercept]);
        r
    }

    fn function(dom: &DecisionDomain, pieces: Vec<Region>) -> WeightedFunction {
        let mut map = PiecewiseMap::new(dom.clone(), 1, pieces).expect("valid map");
        map.rebuild_grid(true, true);
        WeightedFunction::new(map)
    }

    fn steps_domain() -> DecisionDomain {
        let mut dom = DecisionDomain::new();
        assert!(dom.add_var("x", 0.0, 10.0, 11));
        dom
    }

    #[test]
    fn leaf_maximum_becomes_the_incumbent() {
        let dom = steps_domain();
        // Rising line against a falling one. Summed, the composite is flat
        // at 10, so every cell ties and the first surviving leaf wins.
        let a = function(&dom, vec![ramp(0, 10, 1.0, 0.0)]);
        let b = function(&dom, vec![ramp(0, 10, -1.0, 10.0)]);

        let mut best: Incumbent = None;
        Descent::new(&[a, b], 0.0).run(&mut best);
        let (_, weight) = best.expect("fully covered domain");
        assert!((weight - 10.0).abs() < 1e-9);
    }

    #[test]
    fn uncovered_gap_never_reaches_a_leaf() {
        let dom = steps_domain();
        let a = function(&dom, vec![ramp(0, 4, 0.0, 5.0)]);
        let b = function(&dom, vec![ramp(6, 10, 0.0, 9.0)]);

        let mut best: Incumbent = None;
        Descent::new(&[a, b], 0.0).run(&mut best);
        assert!(best.is_none(), "disjoint functions admit no decision");
    }

    #[test]
    fn incumbent_outside_epsilon_survives() {
        let dom = steps_domain();
        let a = function(&dom, vec![ramp(0, 10, 1.0, 0.0)]);
        let b = function(&dom, vec![ramp(0, 10, 0.0, 0.0)]);

        // Seeded just under the true maximum of 10; a margin of 2 keeps
        // the seed, a margin of zero lets the true maximum displace it.
        let seed = (Region::point_at(&[5]), 9.5);
        let mut best: Incumbent = Some(seed.clone());
        Descent::new(&[a.clone(), b.clone()], 2.0).run(&mut best);
        assert_eq!(best.expect("kept").1, 9.5);

        let mut best: Incumbent = Some(seed);
        Descent::new(&[a, b], 0.0).run(&mut best);
        assert!((best.expect("replaced").1 - 10.0).abs() < 1e-9);
    }
}
