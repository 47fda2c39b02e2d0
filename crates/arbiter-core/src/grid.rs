use crate::{DecisionDomain, Region, RegionSet};

/// Odometer over the linear indices of every grid cell a region touches,
/// lowest axis varying fastest.
#[derive(Debug)]
struct CellWalk {
    lo: Vec<i32>,
    hi: Vec<i32>,
    cur: Vec<i32>,
    axis_weight: Vec<i32>,
    done: bool,
}

impl Iterator for CellWalk {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let mut ix = 0i32;
        for (c, w) in self.cur.iter().zip(self.axis_weight.iter()) {
            ix += c * w;
        }
        let mut d = 0;
        loop {
            if d == self.cur.len() {
                self.done = true;
                break;
            }
            self.cur[d] += 1;
            if self.cur[d] <= self.hi[d] {
                break;
            }
            self.cur[d] = self.lo[d];
            d += 1;
        }
        Some(ix as usize)
    }
}

/// A regular lattice over the discretized domain. Each cell tracks the
/// handles of intersecting regions (when region storage is enabled) and a
/// cached upper bound on their maxima, letting range queries and bound
/// lookups skip most of a map's pieces.
///
/// Invariant: a cell's cached bound is at least the true maximum of every
/// region assigned to that cell.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    dim: usize,
    domain_size: Vec<i32>,
    pts_per_cell: Vec<i32>,
    cells_per_axis: Vec<i32>,
    axis_weight: Vec<i32>,
    cells: Vec<RegionSet>,
    bounds: Vec<f64>,
    fresh: Vec<bool>,
    store_regions: bool,
    empty: bool,
    dup_possible: bool,
    entries: usize,
    max_point: Option<Region>,
    max_value: f64,
}

impl SpatialGrid {
    /// Builds an empty grid. Points per cell along each axis come from the
    /// template's upper extent plus one, clamped to `[2, axis size]`.
    pub fn new(domain: &DecisionDomain, cell_template: &Region, store_regions: bool) -> Self {
        let dim = domain.size();
        assert!(dim > 0, "grid requires a non-empty domain");
        assert_eq!(cell_template.dim(), dim, "cell template dimension mismatch");

        let mut domain_size = Vec::with_capacity(dim);
        let mut pts_per_cell = Vec::with_capacity(dim);
        let mut cells_per_axis = Vec::with_capacity(dim);
        let mut total: usize = 1;
        for d in 0..dim {
            let size = domain.var_points(d) as i32;
            let mut per_cell = cell_template.span(d).hi() + 1;
            if per_cell < 2 {
                per_cell = 2;
            }
            if per_cell > size {
                per_cell = size;
            }
            let cells = (size + per_cell - 1) / per_cell;
            domain_size.push(size);
            pts_per_cell.push(per_cell);
            cells_per_axis.push(cells);
            total *= cells as usize;
        }
        let mut axis_weight = vec![1i32; dim];
        for d in 1..dim {
            axis_weight[d] = axis_weight[d - 1] * cells_per_axis[d - 1];
        }

        Self {
            dim,
            domain_size,
            pts_per_cell,
            cells_per_axis,
            axis_weight,
            cells: if store_regions {
                vec![RegionSet::new(); total]
            } else {
                Vec::new()
            },
            bounds: vec![0.0; total],
            fresh: vec![true; total],
            store_regions,
            empty: true,
            dup_possible: false,
            entries: 0,
            max_point: None,
            max_value: 0.0,
        }
    }

    /// Registers a region under `handle` in every cell it touches,
    /// optionally raising those cells' cached bounds. Also tracks the
    /// grid-wide maximal point.
    pub fn add_region(&mut self, handle: usize, region: &Region, update_bound: bool) {
        debug_assert_eq!(region.dim(), self.dim, "region dimension mismatch");
        let region_max = region.max_val();
        if self.max_point.is_none() || region_max > self.max_value {
            self.max_point = Some(region.max_point());
            self.max_value = region_max;
        }
        let mut touched = 0usize;
        for ix in self.cell_walk(region) {
            touched += 1;
            if self.store_regions {
                self.cells[ix].push_back(handle);
                self.entries += 1;
                self.empty = false;
            }
            if update_bound {
                if self.fresh[ix] {
                    self.bounds[ix] = region_max;
                    self.fresh[ix] = false;
                } else if region_max > self.bounds[ix] {
                    self.bounds[ix] = region_max;
                }
            }
        }
        if touched > 1 {
            self.dup_possible = true;
        }
    }

    /// Handles of stored regions in the cells `region` touches. With
    /// `intersect_check` only true geometric intersections are kept.
    /// `regions` must be the storage the handles were registered against.
    /// Deduplicated only when some stored region spans multiple cells.
    pub fn query(&self, region: &Region, intersect_check: bool, regions: &[Region]) -> RegionSet {
        let mut out = RegionSet::new();
        if !self.store_regions {
            return out;
        }
        for ix in self.cell_walk(region) {
            if intersect_check {
                for h in self.cells[ix].iter() {
                    if region.intersects(&regions[h]) {
                        out.push_back(h);
                    }
                }
            } else {
                out.merge_copy(&self.cells[ix]);
            }
        }
        if self.dup_possible {
            out.remove_dups();
        }
        out
    }

    /// Largest cached bound over the cells `region` touches, or over the
    /// whole grid when `region` is `None`. `NEG_INFINITY` when every
    /// consulted cell is still fresh.
    pub fn cheap_bound(&self, region: Option<&Region>) -> f64 {
        let mut best = f64::NEG_INFINITY;
        match region {
            Some(r) => {
                for ix in self.cell_walk(r) {
                    if !self.fresh[ix] && self.bounds[ix] > best {
                        best = self.bounds[ix];
                    }
                }
            }
            None => {
                for ix in 0..self.bounds.len() {
                    if !self.fresh[ix] && self.bounds[ix] > best {
                        best = self.bounds[ix];
                    }
                }
            }
        }
        best
    }

    /// Scales every cached bound, mirroring a weight scale applied to the
    /// owning map's regions.
    pub fn scale_bounds(&mut self, factor: f64) {
        for ix in 0..self.bounds.len() {
            if !self.fresh[ix] {
                self.bounds[ix] *= factor;
            }
        }
        if self.max_point.is_some() {
            self.max_value *= factor;
        }
    }

    /// Shifts every cached bound, mirroring an intercept shift applied to
    /// the owning map's regions.
    pub fn move_bounds(&mut self, amount: f64) {
        for ix in 0..self.bounds.len() {
            if !self.fresh[ix] {
                self.bounds[ix] += amount;
            }
        }
        if self.max_point.is_some() {
            self.max_value += amount;
        }
    }

    /// True until a region handle has been stored in some cell. Grids
    /// built without region storage stay empty.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn stores_regions(&self) -> bool {
        self.store_regions
    }

    /// Point region with the largest max seen by [`SpatialGrid::add_region`].
    pub fn max_point(&self) -> Option<&Region> {
        self.max_point.as_ref()
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn total_cells(&self) -> usize {
        self.bounds.len()
    }

    pub fn cell_counts(&self) -> &[i32] {
        &self.cells_per_axis
    }

    /// Mean number of stored handles per cell.
    pub fn avg_regions_per_cell(&self) -> f64 {
        if self.bounds.is_empty() {
            return 0.0;
        }
        self.entries as f64 / self.bounds.len() as f64
    }

    fn cell_walk(&self, region: &Region) -> CellWalk {
        debug_assert_eq!(region.dim(), self.dim);
        let mut lo = Vec::with_capacity(self.dim);
        let mut hi = Vec::with_capacity(self.dim);
        let mut done = false;
        for d in 0..self.dim {
            let span = region.span(d);
            // Open lower edges start one step later; the upper cell comes
            // from the raw extent clamped to the domain.
            let rel_lo = span.first().max(0);
            let rel_hi = span.hi().min(self.domain_size[d] - 1);
            let lo_cell = rel_lo / self.pts_per_cell[d];
            let hi_cell = rel_hi / self.pts_per_cell[d];
            if lo_cell > hi_cell {
                done = true;
            }
            lo.push(lo_cell);
            hi.push(hi_cell);
        }
        CellWalk {
            cur: lo.clone(),
            lo,
            hi,
            axis_weight: self.axis_weight.clone(),
            done,
        }
    }
}
