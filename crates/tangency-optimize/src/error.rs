//! Optimizer errors

use crate::solver::SolverError;
use tangency_risk::{PerformanceError, WeightError};
use thiserror::Error;

/// Allocation optimizer errors
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The solver could not produce a valid allocation
    #[error("Optimization diverged: {reason}")]
    Diverged {
        /// What went wrong
        reason: String,
    },

    /// Evaluating the final weights failed
    #[error(transparent)]
    Performance(#[from] PerformanceError),

    /// Solver output could not be turned into a weight vector
    #[error(transparent)]
    Weights(#[from] WeightError),

    /// Optimizer settings are unusable
    #[error("Invalid optimizer config: {0}")]
    InvalidConfig(String),
}

impl OptimizeError {
    pub(crate) fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }
}

impl From<SolverError> for OptimizeError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::DimensionMismatch { .. } => Self::InvalidConfig(err.to_string()),
            other => Self::diverged(other.to_string()),
        }
    }
}
