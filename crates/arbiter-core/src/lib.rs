//! Piecewise utility functions over discretized decision spaces.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod domain;
pub mod function;
pub mod grid;
pub mod map;
pub mod region;
pub mod region_set;

pub use domain::{DecisionDomain, DomainVar, Snap};
pub use function::WeightedFunction;
pub use grid::SpatialGrid;
pub use map::PiecewiseMap;
pub use region::{Region, Span};
pub use region_set::RegionSet;
