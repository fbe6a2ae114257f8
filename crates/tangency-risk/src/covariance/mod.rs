//! Asset covariance estimation
//!
//! Provides the shrinkage estimator used to build the risk side of a
//! [`ReturnModel`](crate::ReturnModel), plus the matrix diagnostics used to
//! check that the result is usable by the optimizer.

pub mod ledoit_wolf;
pub mod utils;

pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator, ShrinkageDiagnostics};
pub use utils::{
    EigenDecomposition, condition_number, is_positive_definite,
    is_positive_definite_with_tolerance, jacobi_eigendecomp,
};

use crate::returns::ReturnMatrix;
use ndarray::Array2;
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Too few periods to estimate an N x N covariance
    #[error(
        "Degenerate input: {assets} assets need at least {required} return periods, got {periods}"
    )]
    DegenerateInput {
        /// Number of assets
        assets: usize,
        /// Required number of periods (assets + 1)
        required: usize,
        /// Actual number of periods
        periods: usize,
    },

    /// Matrix is not symmetric positive semi-definite
    #[error("Covariance matrix is not positive semi-definite (min eigenvalue {min_eigenvalue})")]
    NotPositiveSemiDefinite {
        /// Smallest eigenvalue found
        min_eigenvalue: f64,
    },

    /// Matrix is not symmetric
    #[error("Covariance matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Non-finite values in the input
    #[error("Returns contain non-finite values")]
    NonFinite,
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a period and each column an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets)
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError>;
}

/// Ledoit-Wolf covariance of a return matrix with the default configuration.
///
/// # Errors
/// Returns [`CovarianceError::DegenerateInput`] if there are not more
/// periods than assets.
pub fn shrinkage_covariance(returns: &ReturnMatrix) -> Result<Array2<f64>, CovarianceError> {
    LedoitWolfEstimator::default().estimate(returns.values())
}
