//! Return Model
//!
//! The pair (expected returns, covariance) the optimizer works against.
//! Built from a [`ReturnMatrix`]: the sample mean gives the expected
//! returns and the Ledoit-Wolf estimator gives the covariance.
//!
//! Portfolio moments for weights w:
//! E[R_p] = wᵀμ
//! Var(R_p) = wᵀΣw

use crate::covariance::{
    CovarianceError, CovarianceEstimator, LedoitWolfConfig, LedoitWolfEstimator,
    jacobi_eigendecomp,
};
use crate::returns::{ReturnMatrix, ReturnsError, expected_returns};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative tolerance for symmetry and semi-definiteness checks
const MATRIX_TOLERANCE: f64 = 1e-10;

/// Return model errors
#[derive(Debug, Error)]
pub enum ReturnModelError {
    /// Return estimation error
    #[error("Returns error: {0}")]
    Returns(#[from] ReturnsError),

    /// Covariance estimation error
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),
}

/// Expected returns and covariance for N assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnModel {
    symbols: Vec<String>,
    expected_returns: Array1<f64>,
    covariance: Array2<f64>,
}

impl ReturnModel {
    /// Build a model from explicit moments.
    ///
    /// The covariance must be square, match the expected returns, and be
    /// symmetric positive semi-definite.
    pub fn new(
        symbols: Vec<String>,
        expected_returns: Array1<f64>,
        covariance: Array2<f64>,
    ) -> Result<Self, ReturnModelError> {
        let n = expected_returns.len();
        if symbols.len() != n {
            return Err(CovarianceError::DimensionMismatch {
                expected: n,
                actual: symbols.len(),
            }
            .into());
        }
        if covariance.dim() != (n, n) {
            return Err(CovarianceError::DimensionMismatch {
                expected: n,
                actual: covariance.nrows().max(covariance.ncols()),
            }
            .into());
        }
        if expected_returns.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(CovarianceError::NonFinite.into());
        }

        let scale = covariance.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        for i in 0..n {
            for j in (i + 1)..n {
                if (covariance[[i, j]] - covariance[[j, i]]).abs() > MATRIX_TOLERANCE * scale {
                    return Err(CovarianceError::NotSymmetric { row: i, col: j }.into());
                }
            }
        }

        let decomp = jacobi_eigendecomp(&covariance)?;
        let min_eigenvalue = decomp.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
        if min_eigenvalue < -MATRIX_TOLERANCE * scale.max(f64::MIN_POSITIVE) {
            return Err(CovarianceError::NotPositiveSemiDefinite { min_eigenvalue }.into());
        }

        Ok(Self {
            symbols,
            expected_returns,
            covariance,
        })
    }

    /// Fit the model to a return matrix with the default shrinkage settings.
    pub fn from_returns(returns: &ReturnMatrix) -> Result<Self, ReturnModelError> {
        Self::fit(returns, &LedoitWolfConfig::default())
    }

    /// Fit the model to a return matrix
    ///
    /// # Arguments
    /// * `returns` - Periodic returns (T x N)
    /// * `config` - Shrinkage estimator settings
    pub fn fit(
        returns: &ReturnMatrix,
        config: &LedoitWolfConfig,
    ) -> Result<Self, ReturnModelError> {
        let estimator = LedoitWolfEstimator::new(config.clone());
        let covariance = estimator.estimate(returns.values())?;

        Ok(Self {
            symbols: returns.symbols().to_vec(),
            expected_returns: expected_returns(returns),
            covariance,
        })
    }

    /// Asset symbols, in model order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Per-period expected returns (N)
    pub const fn expected_returns(&self) -> &Array1<f64> {
        &self.expected_returns
    }

    /// Per-period covariance (N x N)
    pub const fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Number of assets
    pub fn n_assets(&self) -> usize {
        self.expected_returns.len()
    }

    /// Per-period portfolio variance wᵀΣw
    pub fn portfolio_variance(&self, weights: &Array1<f64>) -> f64 {
        weights.dot(&self.covariance.dot(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("A{i}")).collect()
    }

    #[test]
    fn test_model_from_returns() {
        let returns = ReturnMatrix::from_values(
            symbols(2),
            array![[0.01, 0.015], [0.02, 0.01], [-0.01, 0.02], [0.005, 0.0]],
        )
        .unwrap();

        let model = ReturnModel::from_returns(&returns).unwrap();
        assert_eq!(model.n_assets(), 2);
        assert_relative_eq!(model.expected_returns()[0], 0.00625, epsilon = 1e-12);
        assert_relative_eq!(model.expected_returns()[1], 0.01125, epsilon = 1e-12);
        assert_eq!(model.covariance().dim(), (2, 2));
    }

    #[test]
    fn test_model_needs_more_periods_than_assets() {
        let returns =
            ReturnMatrix::from_values(symbols(2), array![[0.01, 0.015], [0.02, 0.01]]).unwrap();

        let err = ReturnModel::from_returns(&returns).unwrap_err();
        assert!(matches!(
            err,
            ReturnModelError::Covariance(CovarianceError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_explicit_model_validation() {
        let ok = ReturnModel::new(
            symbols(2),
            array![0.001, 0.0015],
            array![[0.0004, 0.0001], [0.0001, 0.0005]],
        );
        assert!(ok.is_ok());

        let asymmetric = ReturnModel::new(
            symbols(2),
            array![0.001, 0.0015],
            array![[0.0004, 0.0002], [0.0001, 0.0005]],
        );
        assert!(matches!(
            asymmetric,
            Err(ReturnModelError::Covariance(CovarianceError::NotSymmetric { .. }))
        ));

        let indefinite = ReturnModel::new(
            symbols(2),
            array![0.001, 0.0015],
            array![[0.0001, 0.0004], [0.0004, 0.0001]],
        );
        assert!(matches!(
            indefinite,
            Err(ReturnModelError::Covariance(
                CovarianceError::NotPositiveSemiDefinite { .. }
            ))
        ));

        let wrong_shape = ReturnModel::new(symbols(2), array![0.001, 0.0015], Array2::eye(3));
        assert!(wrong_shape.is_err());
    }

    #[test]
    fn test_portfolio_variance() {
        let model = ReturnModel::new(
            symbols(2),
            array![0.001, 0.0015],
            array![[0.0004, 0.0001], [0.0001, 0.0005]],
        )
        .unwrap();

        // 0.25 * 0.0004 + 2 * 0.25 * 0.0001 + 0.25 * 0.0005
        assert_relative_eq!(
            model.portfolio_variance(&array![0.5, 0.5]),
            0.000275,
            epsilon = 1e-15
        );
    }
}
