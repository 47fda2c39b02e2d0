use core::cmp::Ordering;

use crate::DecisionDomain;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One axis of a [`Region`]: a discrete interval with per-edge open flags.
///
/// Edges are inclusive unless marked open. A span covers discrete steps,
/// so `[3, 5]` holds three points while `(3, 5)` holds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    lo: i32,
    hi: i32,
    lo_open: bool,
    hi_open: bool,
}

impl Span {
    pub fn new(lo: i32, hi: i32) -> Self {
        Self {
            lo,
            hi,
            lo_open: false,
            hi_open: false,
        }
    }

    pub fn point(at: i32) -> Self {
        Self::new(at, at)
    }

    pub fn lo(&self) -> i32 {
        self.lo
    }

    pub fn hi(&self) -> i32 {
        self.hi
    }

    pub fn lo_open(&self) -> bool {
        self.lo_open
    }

    pub fn hi_open(&self) -> bool {
        self.hi_open
    }

    pub fn set(&mut self, lo: i32, hi: i32) {
        self.lo = lo;
        self.hi = hi;
    }

    pub fn set_open(&mut self, lo_open: bool, hi_open: bool) {
        self.lo_open = lo_open;
        self.hi_open = hi_open;
    }

    /// First discrete step actually contained.
    pub fn first(&self) -> i32 {
        if self.lo_open {
            self.lo + 1
        } else {
            self.lo
        }
    }

    /// Last discrete step actually contained.
    pub fn last(&self) -> i32 {
        if self.hi_open {
            self.hi - 1
        } else {
            self.hi
        }
    }
}

/// An axis-aligned box over discrete decision space carrying a separable
/// polynomial of degree 0, 1, or 2.
///
/// The weight layout over `dim` axes is degree 0: `[c]`; degree 1:
/// `[lin_0.., c]`; degree 2: `[quad_0.., lin_0.., c]`. There are no cross
/// terms, so extrema decompose by axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    spans: Vec<Span>,
    weights: Vec<f64>,
    degree: usize,
}

impl Region {
    /// A region over `dim` axes, spans collapsed to `[0, 0]`, weights zeroed.
    pub fn new(dim: usize, degree: usize) -> Self {
        assert!(dim > 0, "region must span at least one axis");
        assert!(degree <= 2, "only degrees 0, 1, and 2 are supported");
        Self {
            spans: vec![Span::new(0, 0); dim],
            weights: vec![0.0; degree * dim + 1],
            degree,
        }
    }

    /// A degree-0 point region at the given coordinates.
    pub fn point_at(coords: &[i32]) -> Self {
        let mut out = Self::new(coords.len(), 0);
        for (d, &c) in coords.iter().enumerate() {
            out.spans[d] = Span::point(c);
        }
        out
    }

    /// A region covering the full discrete extent of every domain variable.
    pub fn spanning(domain: &DecisionDomain, degree: usize) -> Self {
        let mut out = Self::new(domain.size(), degree);
        for d in 0..domain.size() {
            out.spans[d] = Span::new(0, domain.var_points(d) as i32 - 1);
        }
        out
    }

    pub fn dim(&self) -> usize {
        self.spans.len()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn coeff_count(&self) -> usize {
        self.weights.len()
    }

    pub fn span(&self, d: usize) -> Span {
        self.spans[d]
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn set_span(&mut self, d: usize, lo: i32, hi: i32) {
        self.spans[d].set(lo, hi);
    }

    pub fn set_span_open(&mut self, d: usize, lo_open: bool, hi_open: bool) {
        self.spans[d].set_open(lo_open, hi_open);
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn set_weight(&mut self, i: usize, w: f64) {
        self.weights[i] = w;
    }

    pub fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(
            weights.len(),
            self.weights.len(),
            "weight vector length must match degree * dim + 1"
        );
        self.weights.copy_from_slice(weights);
    }

    /// Zeroes every coefficient and sets the intercept to `w`.
    pub fn set_constant(&mut self, w: f64) {
        for wt in &mut self.weights {
            *wt = 0.0;
        }
        if let Some(last) = self.weights.last_mut() {
            *last = w;
        }
    }

    pub fn scale_weights(&mut self, factor: f64) {
        for wt in &mut self.weights {
            *wt *= factor;
        }
    }

    pub fn shift_intercept(&mut self, amount: f64) {
        if let Some(last) = self.weights.last_mut() {
            *last += amount;
        }
    }

    /// True for a single discrete point: every axis either a zero-width
    /// closed interval or a unit-width interval open at both ends.
    pub fn is_point(&self) -> bool {
        self.spans.iter().all(|s| {
            if s.lo == s.hi {
                !s.lo_open && !s.hi_open
            } else {
                s.hi - s.lo == 1 && s.lo_open && s.hi_open
            }
        })
    }

    /// Largest value the polynomial attains over the region.
    pub fn max_val(&self) -> f64 {
        self.extremum(true).0
    }

    /// Smallest value the polynomial attains over the region.
    pub fn min_val(&self) -> f64 {
        self.extremum(false).0
    }

    /// Point region at which [`Region::max_val`] is attained.
    pub fn max_point(&self) -> Region {
        Region::point_at(&self.extremum(true).1)
    }

    /// Polynomial value at a point region.
    pub fn point_val(&self, at: &Region) -> f64 {
        debug_assert!(at.is_point(), "point_val expects a point region");
        debug_assert_eq!(at.dim(), self.dim(), "dimension mismatch");
        let dim = self.dim();
        match self.degree {
            0 => self.weights[0],
            1 => {
                let mut total = self.weights[dim];
                for d in 0..dim {
                    total += self.weights[d] * f64::from(at.spans[d].lo);
                }
                total
            }
            _ => {
                let mut total = self.weights[2 * dim];
                for d in 0..dim {
                    let p = f64::from(at.spans[d].lo);
                    total += self.weights[d] * p * p + self.weights[d + dim] * p;
                }
                total
            }
        }
    }

    /// True when the two regions share at least one point of decision
    /// space. Reflexive and symmetric. Regions touching only at an open
    /// edge do not intersect.
    pub fn intersects(&self, other: &Region) -> bool {
        debug_assert_eq!(self.dim(), other.dim(), "dimension mismatch");
        for d in 0..self.dim() {
            let a = self.spans[d];
            let b = other.spans[d];
            if a.lo > b.hi || a.hi < b.lo {
                return false;
            }
        }
        for d in 0..self.dim() {
            let a = self.spans[d];
            let b = other.spans[d];
            if a.lo == b.hi && (a.lo_open || b.hi_open) {
                return false;
            }
            if a.hi == b.lo && (a.hi_open || b.lo_open) {
                return false;
            }
        }
        true
    }

    /// Materialized intersection: per edge the tighter bound wins (equal
    /// bounds stay closed only if closed on both sides) and the weight
    /// vectors are summed. Mixed degrees promote to the higher degree.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.intersects(other) {
            return None;
        }
        let dim = self.dim();
        let degree = self.degree.max(other.degree);
        let mut out = Region::new(dim, degree);
        for d in 0..dim {
            let a = self.spans[d];
            let b = other.spans[d];
            let (lo, lo_open) = match a.lo.cmp(&b.lo) {
                Ordering::Greater => (a.lo, a.lo_open),
                Ordering::Less => (b.lo, b.lo_open),
                Ordering::Equal => (a.lo, a.lo_open || b.lo_open),
            };
            let (hi, hi_open) = match a.hi.cmp(&b.hi) {
                Ordering::Less => (a.hi, a.hi_open),
                Ordering::Greater => (b.hi, b.hi_open),
                Ordering::Equal => (a.hi, a.hi_open || b.hi_open),
            };
            out.spans[d] = Span {
                lo,
                hi,
                lo_open,
                hi_open,
            };
        }
        let wa = self.promoted_weights(degree);
        let wb = other.promoted_weights(degree);
        for (o, (a, b)) in out.weights.iter_mut().zip(wa.iter().zip(wb.iter())) {
            *o = a + b;
        }
        Some(out)
    }

    /// Re-expresses the region over a larger axis set. `axis_map[d]` gives
    /// the new position of current axis `d`. Unmapped axes collapse to
    /// `[0, 0]` closed with zero coefficients; the owning map widens them.
    pub fn remap_axes(&mut self, new_dim: usize, axis_map: &[usize]) {
        let old_dim = self.dim();
        assert_eq!(axis_map.len(), old_dim, "axis map length mismatch");
        assert!(new_dim >= old_dim, "cannot remap onto fewer axes");
        debug_assert!(axis_map.iter().all(|&nd| nd < new_dim));

        let mut spans = vec![Span::new(0, 0); new_dim];
        for (d, &nd) in axis_map.iter().enumerate() {
            spans[nd] = self.spans[d];
        }
        let mut weights = vec![0.0; self.degree * new_dim + 1];
        match self.degree {
            0 => weights[0] = self.weights[0],
            1 => {
                for (d, &nd) in axis_map.iter().enumerate() {
                    weights[nd] = self.weights[d];
                }
                weights[new_dim] = self.weights[old_dim];
            }
            _ => {
                for (d, &nd) in axis_map.iter().enumerate() {
                    weights[nd] = self.weights[d];
                    weights[new_dim + nd] = self.weights[old_dim + d];
                }
                weights[2 * new_dim] = self.weights[2 * old_dim];
            }
        }
        self.spans = spans;
        self.weights = weights;
    }

    /// Weight vector re-laid-out for a higher degree, preserving the
    /// polynomial.
    fn promoted_weights(&self, degree: usize) -> Vec<f64> {
        debug_assert!(degree >= self.degree);
        if degree == self.degree {
            return self.weights.clone();
        }
        let dim = self.dim();
        let mut out = vec![0.0; degree * dim + 1];
        match (self.degree, degree) {
            (0, _) => out[degree * dim] = self.weights[0],
            (1, 2) => {
                out[dim..2 * dim].copy_from_slice(&self.weights[..dim]);
                out[2 * dim] = self.weights[dim];
            }
            _ => unreachable!("degree can only be promoted upward"),
        }
        out
    }

    /// Axis-separable extremum search shared by `max_val`, `min_val`, and
    /// `max_point`. Degree 1 picks the corner matching each coefficient's
    /// sign; degree 2 also tests floor/ceil of each axis parabola vertex
    /// when it falls strictly inside the extent.
    fn extremum(&self, maximize: bool) -> (f64, Vec<i32>) {
        let dim = self.dim();
        let mut point = vec![0; dim];
        match self.degree {
            0 => {
                for d in 0..dim {
                    let s = self.spans[d];
                    point[d] = (s.hi - s.lo) / 2 + s.lo;
                }
                (self.weights[0], point)
            }
            1 => {
                let mut total = self.weights[dim];
                for d in 0..dim {
                    let s = self.spans[d];
                    let w = self.weights[d];
                    let pick_hi = if maximize { w >= 0.0 } else { w < 0.0 };
                    let p = if pick_hi { s.hi } else { s.lo };
                    total += w * f64::from(p);
                    point[d] = p;
                }
                (total, point)
            }
            _ => {
                let mut total = self.weights[2 * dim];
                for d in 0..dim {
                    let s = self.spans[d];
                    let quad = self.weights[d];
                    let lin = self.weights[d + dim];
                    let mut candidates = [s.lo, s.hi, 0, 0];
                    let mut count = 2;
                    if quad != 0.0 {
                        let vertex = -lin / (2.0 * quad);
                        if vertex > f64::from(s.lo) && vertex < f64::from(s.hi) {
                            candidates[2] = vertex.floor() as i32;
                            candidates[3] = vertex.ceil() as i32;
                            count = 4;
                        }
                    }
                    let mut best_pt = candidates[0];
                    let mut best_val = 0.0;
                    for (i, &p) in candidates.iter().take(count).enumerate() {
                        let pf = f64::from(p);
                        let pval = quad * pf * pf + lin * pf;
                        let better = if maximize {
                            pval > best_val
                        } else {
                            pval < best_val
                        };
                        if i == 0 || better {
                            best_val = pval;
                            best_pt = p;
                        }
                    }
                    total += best_val;
                    point[d] = best_pt;
                }
                (total, point)
            }
        }
    }
}
