#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod optimizer;
pub mod simplex;
pub mod solver;

// Re-export main types
pub use error::OptimizeError;
pub use optimizer::{AllocationOptimizer, OptimizationResult, negative_sharpe};
pub use simplex::{FeasibleSet, LinearEquality, Simplex, SimplexSlice, project_onto_simplex};
pub use solver::{OptimizerConfig, Solution, SolverError, minimize_on_simplex};
