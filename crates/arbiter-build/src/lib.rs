//! Builders that turn sparse utility curves into piecewise functions.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod threshold;
pub mod util;
pub mod vector;

pub use threshold::ThresholdBuilder;
pub use util::{domain_to_region, parse_domain, sub_domain, uniform_regions, uniform_template};
pub use vector::VectorBuilder;

use thiserror::Error;

/// Errors raised when a sample curve cannot become a valid function.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("variable {0:?} does not give a one-dimensional domain with a positive step")]
    BadDomain(String),

    #[error("domain samples and utility samples differ in length ({domain} vs {utility})")]
    LengthMismatch { domain: usize, utility: usize },

    #[error("invalid utility range: low {low} is not below high {high}")]
    InvalidUtilityRange { low: f64, high: f64 },

    #[error("fewer than two distinct domain indices after quantization")]
    TooFewSamples,

    #[error("base width must be non-negative, got {0}")]
    NegativeBaseWidth(f64),
}

pub type Result<T> = std::result::Result<T, BuildError>;
