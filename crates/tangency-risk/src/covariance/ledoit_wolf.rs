//! Ledoit-Wolf Shrinkage Covariance Estimator
//!
//! Implements the analytical shrinkage estimator from:
//! "A well-conditioned estimator for large-dimensional covariance matrices"
//! (Ledoit & Wolf, 2004)
//!
//! The sample covariance matrix is shrunk toward a scaled identity so that
//! the estimate stays well conditioned when the number of periods is close
//! to the number of assets:
//!
//! Σ_LW = (1-δ*) S + δ* μ I
//!
//! where:
//! - S is the sample covariance matrix (1/T normalization)
//! - μ = trace(S) / N is the average variance
//! - δ* = min(π̂ / T, γ̂) / γ̂ is the optimal shrinkage intensity
//! - π̂ = (1/T) Σ_t ||x_t x_tᵀ - S||²_F estimates the sampling noise in S
//! - γ̂ = ||S - μ I||²_F measures how far S is from the target

use super::{CovarianceError, CovarianceEstimator, condition_number};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Ledoit-Wolf covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedoitWolfConfig {
    /// Whether to center returns (subtract mean) before computing covariance
    pub center: bool,
}

impl Default for LedoitWolfConfig {
    fn default() -> Self {
        Self { center: true }
    }
}

/// Diagnostics for one shrinkage estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShrinkageDiagnostics {
    /// Shrinkage intensity δ* in [0, 1]
    pub intensity: f64,
    /// Average sample variance μ (the identity scale)
    pub mean_variance: f64,
    /// Condition number of the raw sample covariance
    pub sample_condition: f64,
    /// Condition number of the shrunk covariance
    pub shrunk_condition: f64,
}

/// Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Default, Clone)]
pub struct LedoitWolfEstimator {
    config: LedoitWolfConfig,
}

impl LedoitWolfEstimator {
    /// Create a new Ledoit-Wolf estimator with the given configuration
    pub const fn new(config: LedoitWolfConfig) -> Self {
        Self { config }
    }

    fn check_input(returns: &Array2<f64>) -> Result<(), CovarianceError> {
        let (n_periods, n_assets) = returns.dim();
        if n_assets == 0 {
            return Err(CovarianceError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if n_periods < n_assets + 1 {
            return Err(CovarianceError::DegenerateInput {
                assets: n_assets,
                required: n_assets + 1,
                periods: n_periods,
            });
        }
        if returns.iter().any(|v| !v.is_finite()) {
            return Err(CovarianceError::NonFinite);
        }
        Ok(())
    }

    fn prepare(&self, returns: &Array2<f64>) -> Array2<f64> {
        if self.config.center {
            // check_input guarantees at least one row
            let n = returns.nrows() as f64;
            let means = returns.sum_axis(Axis(0)) / n;
            returns - &means.insert_axis(Axis(0))
        } else {
            returns.clone()
        }
    }

    /// Sample covariance S = (1/T) XᵀX of prepared returns
    fn sample_covariance(x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows() as f64;
        x.t().dot(x) / n
    }

    /// Optimal intensity and target scale for prepared returns `x`
    fn shrinkage_intensity(x: &Array2<f64>, sample_cov: &Array2<f64>) -> (f64, f64) {
        let (n_periods, n_assets) = x.dim();
        let t = n_periods as f64;

        let mu = sample_cov.diag().sum() / n_assets as f64;

        // γ̂ = ||S - μI||²_F
        let mut gamma_hat = 0.0;
        for ((i, j), &s) in sample_cov.indexed_iter() {
            let target = if i == j { mu } else { 0.0 };
            let diff = s - target;
            gamma_hat += diff * diff;
        }

        // π̂ = (1/T) Σ_t ||x_t x_tᵀ - S||²_F
        let mut pi_hat = 0.0;
        for row in x.axis_iter(Axis(0)) {
            for i in 0..n_assets {
                for j in 0..n_assets {
                    let diff = row[i] * row[j] - sample_cov[[i, j]];
                    pi_hat += diff * diff;
                }
            }
        }
        pi_hat /= t;

        let delta = if gamma_hat > 0.0 {
            ((pi_hat / t).min(gamma_hat) / gamma_hat).clamp(0.0, 1.0)
        } else {
            // Sample covariance already equals the target
            0.0
        };

        (delta, mu)
    }

    fn shrink(sample_cov: &Array2<f64>, delta: f64, mu: f64) -> Array2<f64> {
        let n = sample_cov.nrows();
        sample_cov * (1.0 - delta) + &(Array2::<f64>::eye(n) * (delta * mu))
    }

    /// Shrinkage intensity that [`estimate`](CovarianceEstimator::estimate)
    /// would apply to `returns`.
    pub fn shrinkage(&self, returns: &Array2<f64>) -> Result<f64, CovarianceError> {
        Self::check_input(returns)?;
        let x = self.prepare(returns);
        let sample_cov = Self::sample_covariance(&x);
        Ok(Self::shrinkage_intensity(&x, &sample_cov).0)
    }

    /// Estimate the covariance and report how much shrinkage was applied.
    pub fn estimate_with_diagnostics(
        &self,
        returns: &Array2<f64>,
    ) -> Result<(Array2<f64>, ShrinkageDiagnostics), CovarianceError> {
        Self::check_input(returns)?;
        let x = self.prepare(returns);
        let sample_cov = Self::sample_covariance(&x);
        let (delta, mu) = Self::shrinkage_intensity(&x, &sample_cov);
        let shrunk = Self::shrink(&sample_cov, delta, mu);

        let diagnostics = ShrinkageDiagnostics {
            intensity: delta,
            mean_variance: mu,
            sample_condition: condition_number(&sample_cov),
            shrunk_condition: condition_number(&shrunk),
        };

        Ok((shrunk, diagnostics))
    }
}

impl CovarianceEstimator for LedoitWolfEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        Self::check_input(returns)?;
        let x = self.prepare(returns);
        let sample_cov = Self::sample_covariance(&x);
        let (delta, mu) = Self::shrinkage_intensity(&x, &sample_cov);

        tracing::debug!(
            periods = returns.nrows(),
            assets = returns.ncols(),
            intensity = delta,
            "ledoit-wolf shrinkage"
        );

        Ok(Self::shrink(&sample_cov, delta, mu))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::is_positive_definite;
    use approx::assert_relative_eq;

    fn wavy_returns(n_periods: usize, n_assets: usize) -> Array2<f64> {
        Array2::from_shape_fn((n_periods, n_assets), |(t, j)| {
            0.01 * ((t * (j + 2)) as f64 * 0.37 + j as f64).sin()
        })
    }

    #[test]
    fn test_config_default() {
        let config = LedoitWolfConfig::default();
        assert!(config.center);
    }

    #[test]
    fn test_degenerate_input() {
        let estimator = LedoitWolfEstimator::default();

        // 3 assets need at least 4 periods
        let returns = Array2::<f64>::zeros((3, 3));
        let err = estimator.estimate(&returns).unwrap_err();
        assert!(matches!(
            err,
            CovarianceError::DegenerateInput {
                assets: 3,
                required: 4,
                periods: 3
            }
        ));

        let returns = wavy_returns(4, 3);
        assert!(estimator.estimate(&returns).is_ok());
    }

    #[test]
    fn test_sample_covariance_simple() {
        let returns = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap();
        let sample_cov = LedoitWolfEstimator::sample_covariance(&returns);

        // Uncentered: (1/3) * [[14, 28], [28, 56]]
        assert_relative_eq!(sample_cov[[0, 0]], 14.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[0, 1]], 28.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[1, 0]], 28.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[1, 1]], 56.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_matches_closed_form_on_small_sample() {
        // Centered data x_t = ±(a, b) alternating:
        // S = [[a², ab], [ab, b²]], every x_t x_tᵀ equals S, so π̂ = 0
        let returns = Array2::from_shape_vec(
            (4, 2),
            vec![0.02, 0.01, -0.02, -0.01, 0.02, 0.01, -0.02, -0.01],
        )
        .unwrap();

        let estimator = LedoitWolfEstimator::default();
        let delta = estimator.shrinkage(&returns).unwrap();
        assert_relative_eq!(delta, 0.0, epsilon = 1e-12);

        let cov = estimator.estimate(&returns).unwrap();
        assert_relative_eq!(cov[[0, 0]], 0.0004, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 0.0002, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 0.0001, epsilon = 1e-12);
    }

    #[test]
    fn test_shrinkage_intensity_bounds() {
        let estimator = LedoitWolfEstimator::default();
        let returns = Array2::from_shape_vec(
            (10, 3),
            vec![
                0.01, 0.02, -0.01, -0.01, 0.01, 0.02, 0.02, -0.01, 0.01, -0.02, 0.01, -0.01, 0.01,
                -0.02, 0.02, 0.02, 0.01, -0.02, -0.01, -0.01, 0.01, 0.01, 0.02, 0.01, -0.02, -0.01,
                -0.01, 0.01, 0.01, 0.02,
            ],
        )
        .unwrap();

        let delta = estimator.shrinkage(&returns).unwrap();
        assert!((0.0..=1.0).contains(&delta), "Invalid shrinkage: {}", delta);
    }

    #[test]
    fn test_estimate_produces_valid_covariance() {
        let estimator = LedoitWolfEstimator::default();
        let returns = wavy_returns(30, 4);

        let cov = estimator.estimate(&returns).unwrap();
        assert_eq!(cov.dim(), (4, 4));

        for i in 0..4 {
            assert!(cov[[i, i]] > 0.0);
            for j in 0..4 {
                assert_relative_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-12);
            }
        }
        assert!(is_positive_definite(&cov));
    }

    #[test]
    fn test_shrinkage_improves_conditioning() {
        // 6 periods for 5 assets: the sample covariance is close to singular
        let estimator = LedoitWolfEstimator::default();
        let returns = wavy_returns(6, 5);

        let (_, diagnostics) = estimator.estimate_with_diagnostics(&returns).unwrap();
        assert!(diagnostics.intensity > 0.0);
        assert!(diagnostics.shrunk_condition < diagnostics.sample_condition);
    }

    #[test]
    fn test_shrinkage_preserves_trace() {
        let estimator = LedoitWolfEstimator::default();
        let returns = wavy_returns(12, 3);

        let x = estimator.prepare(&returns);
        let sample = LedoitWolfEstimator::sample_covariance(&x);
        let shrunk = estimator.estimate(&returns).unwrap();

        assert_relative_eq!(shrunk.diag().sum(), sample.diag().sum(), epsilon = 1e-14);
    }

    #[test]
    fn test_rejects_non_finite() {
        let estimator = LedoitWolfEstimator::default();
        let mut returns = wavy_returns(5, 2);
        returns[[2, 1]] = f64::NAN;
        assert!(matches!(
            estimator.estimate(&returns),
            Err(CovarianceError::NonFinite)
        ));
    }
}
