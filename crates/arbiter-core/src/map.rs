use crate::{DecisionDomain, Region, SpatialGrid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piecewise-defined utility function: a set of regions tiling (part of)
/// the decision space, an optional spatial grid accelerating queries over
/// them, and the domain they are expressed over.
///
/// Regions are addressed by handle (their index in construction order).
/// The grid stores handles only and is rebuilt from scratch on demand, so
/// weight updates and domain re-projection can never leave it dangling.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PiecewiseMap {
    domain: DecisionDomain,
    degree: usize,
    regions: Vec<Region>,
    cell_template: Region,
    // Derived state, rebuilt on demand rather than serialized.
    #[cfg_attr(feature = "serde", serde(skip))]
    grid: Option<SpatialGrid>,
}

impl PiecewiseMap {
    /// Builds a map over `domain` from a complete set of regions. Returns
    /// `None` when the domain is empty, the degree is unsupported, or any
    /// region disagrees with the domain dimension or the degree.
    pub fn new(domain: DecisionDomain, degree: usize, regions: Vec<Region>) -> Option<Self> {
        if domain.is_empty() || degree > 2 {
            return None;
        }
        let dim = domain.size();
        if regions.iter().any(|r| r.dim() != dim || r.degree() != degree) {
            return None;
        }
        let cell_template = Region::spanning(&domain, 0);
        Some(Self {
            domain,
            degree,
            regions,
            cell_template,
            grid: None,
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn dim(&self) -> usize {
        self.domain.size()
    }

    pub fn domain(&self) -> &DecisionDomain {
        &self.domain
    }

    pub fn region(&self, handle: usize) -> Option<&Region> {
        self.regions.get(handle)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Region spanning the full discrete extent of the domain, weights
    /// zeroed.
    pub fn universe(&self) -> Region {
        Region::spanning(&self.domain, self.degree)
    }

    /// Evaluates the map at a point region. `None` means uncovered: no
    /// piece contains the point, or (with a grid) more than one does.
    /// Callers treating uncovered as zero contribution use
    /// `unwrap_or(0.0)`.
    pub fn eval_point(&self, point: &Region) -> Option<f64> {
        if self.regions.is_empty() {
            // A map with no pieces contributes zero without claiming any
            // point infeasible.
            return Some(0.0);
        }
        debug_assert!(point.is_point(), "eval_point expects a point region");
        debug_assert_eq!(point.dim(), self.dim(), "dimension mismatch");
        if !point.is_point() || point.dim() != self.dim() {
            return None;
        }
        match &self.grid {
            Some(grid) => {
                let hits = grid.query(point, true, &self.regions);
                if hits.len() == 1 {
                    let handle = hits.front()?;
                    Some(self.regions[handle].point_val(point))
                } else {
                    None
                }
            }
            None => {
                // Linear fallback: first containing piece wins.
                self.regions
                    .iter()
                    .find(|r| r.intersects(point))
                    .map(|r| r.point_val(point))
            }
        }
    }

    /// Handle of a region intersecting the given point, if any.
    pub fn piece_containing(&self, point: &Region) -> Option<usize> {
        match &self.grid {
            Some(grid) => grid.query(point, true, &self.regions).front(),
            None => self.regions.iter().position(|r| r.intersects(point)),
        }
    }

    /// Handles of every region intersecting `probe`, using the grid when
    /// present and a linear scan otherwise.
    pub fn query(&self, probe: &Region) -> crate::RegionSet {
        match &self.grid {
            Some(grid) => grid.query(probe, true, &self.regions),
            None => self
                .regions
                .iter()
                .enumerate()
                .filter(|(_, r)| probe.intersects(r))
                .map(|(h, _)| h)
                .collect(),
        }
    }

    /// Multiplies every region's weights and the grid's cached bounds.
    pub fn apply_weight(&mut self, weight: f64) {
        for r in &mut self.regions {
            r.scale_weights(weight);
        }
        if let Some(grid) = &mut self.grid {
            grid.scale_bounds(weight);
        }
    }

    /// Adds to every region's intercept and the grid's cached bounds.
    pub fn apply_scalar(&mut self, amount: f64) {
        for r in &mut self.regions {
            r.shift_intercept(amount);
        }
        if let Some(grid) = &mut self.grid {
            grid.move_bounds(amount);
        }
    }

    /// Rescales the map so its values span `[target_base, target_base +
    /// target_range]`. No-op when the existing range is not positive.
    pub fn normalize(&mut self, target_base: f64, target_range: f64) {
        let existing_base = self.min_weight();
        let existing_range = self.max_weight() - existing_base;
        if existing_range <= 0.0 {
            return;
        }
        // Shift first, then scale. Exact for a zero target base, which is
        // how function intake calls it.
        self.apply_scalar(target_base - existing_base);
        self.apply_weight(target_range / existing_range);
    }

    /// Smallest value attained by any piece, 0 for an empty map.
    pub fn min_weight(&self) -> f64 {
        let mut out = 0.0;
        for (i, r) in self.regions.iter().enumerate() {
            let v = r.min_val();
            if i == 0 || v < out {
                out = v;
            }
        }
        out
    }

    /// Largest value attained by any piece, 0 for an empty map.
    pub fn max_weight(&self) -> f64 {
        let mut out = 0.0;
        for (i, r) in self.regions.iter().enumerate() {
            let v = r.max_val();
            if i == 0 || v > out {
                out = v;
            }
        }
        out
    }

    pub fn cell_template(&self) -> &Region {
        &self.cell_template
    }

    /// Replaces the grid-cell sizing template. Returns false when the
    /// template's dimension or extents disagree with the domain.
    pub fn set_cell_template(&mut self, template: Region) -> bool {
        if template.dim() != self.dim() {
            return false;
        }
        for d in 0..self.dim() {
            let s = template.span(d);
            if s.lo() > s.hi() || s.lo() < 0 {
                return false;
            }
            if s.hi() > self.domain.var_points(d) as i32 - 1 {
                return false;
            }
        }
        self.cell_template = template;
        true
    }

    /// Cell template sized so a grid holds roughly a quarter as many cells
    /// as the map has pieces, at least `2^dim`, capped at 40_000.
    pub fn auto_cell_template(&self) -> Region {
        let dim = self.dim();
        let mut max_cells = (self.len() / 4) as f64;
        let floor = (2f64).powi(dim as i32);
        if max_cells < floor {
            max_cells = floor;
        }
        if max_cells > 40_000.0 {
            max_cells = 40_000.0;
        }
        let mut per_edge: u32 = 1;
        let mut cells = 1.0;
        while cells <= max_cells {
            per_edge += 1;
            cells = (per_edge as f64).powi(dim as i32);
        }
        let mut template = Region::new(dim, 0);
        for d in 0..dim {
            let size = self.domain.var_points(d) as u32;
            let mut cell_pts = size / per_edge;
            if size % per_edge != 0 {
                cell_pts += 1;
            }
            let cell_pts = cell_pts.clamp(1, size);
            template.set_span(d, 0, cell_pts as i32 - 1);
        }
        template
    }

    /// Discards any existing grid and rebuilds it from the current regions
    /// and cell template. `store_regions` fills the per-cell handle sets;
    /// `update_bounds` fills the per-cell upper bounds.
    pub fn rebuild_grid(&mut self, store_regions: bool, update_bounds: bool) {
        let mut grid = SpatialGrid::new(&self.domain, &self.cell_template, store_regions);
        for (handle, region) in self.regions.iter().enumerate() {
            grid.add_region(handle, region, update_bounds);
        }
        tracing::debug!(
            pieces = self.regions.len(),
            cells = grid.total_cells(),
            "rebuilt spatial grid"
        );
        self.grid = Some(grid);
    }

    /// Re-expresses the map over a larger domain. `placement[d]` names the
    /// new index of current axis `d`; axes the map did not previously
    /// cover widen to their full range. Rebuilds the grid if one existed.
    pub fn remap_domain(&mut self, new_domain: &DecisionDomain, placement: &[usize]) -> bool {
        let old_dim = self.dim();
        let new_dim = new_domain.size();
        if placement.len() != old_dim || new_dim < old_dim {
            return false;
        }
        if placement.iter().any(|&p| p >= new_dim) {
            return false;
        }

        self.cell_template.remap_axes(new_dim, placement);
        for r in &mut self.regions {
            r.remap_axes(new_dim, placement);
        }

        let mut carried = vec![false; new_dim];
        for &p in placement {
            carried[p] = true;
        }
        for (d, carried) in carried.iter().enumerate() {
            if *carried {
                continue;
            }
            let hi = new_domain.var_points(d) as i32 - 1;
            self.cell_template.set_span(d, 0, hi);
            for r in &mut self.regions {
                r.set_span(d, 0, hi);
            }
        }

        self.domain = new_domain.clone();
        if self.grid.is_some() {
            self.rebuild_grid(true, true);
        }
        true
    }

    /// True when every weight of every region is finite.
    pub fn all_finite(&self) -> bool {
        self.regions
            .iter()
            .all(|r| r.weights().iter().all(|w| w.is_finite()))
    }
}
