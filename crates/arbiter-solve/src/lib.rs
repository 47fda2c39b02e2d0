//! Multi-objective decision problems over piecewise utility functions.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod problem;
mod search;

pub use problem::{Problem, SeedPolicy, Solution, SolverConfig};

use thiserror::Error;

/// Errors raised when a problem cannot produce a decision.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("problem holds no functions")]
    NoFunctions,

    #[error("cannot align {context:?}: variable {var:?} is not in the problem domain")]
    MissingVariable { context: String, var: String },

    #[error("no point of the decision space is covered by every function")]
    Infeasible,
}

pub type Result<T> = std::result::Result<T, SolveError>;
