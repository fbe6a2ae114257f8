//! Maximum-Sharpe allocation
//!
//! Maximizes the annualized Sharpe ratio over long-only, fully invested
//! portfolios, optionally pinned to a target annualized return. The
//! negative Sharpe ratio and its analytic gradient form a closure handed
//! to [`minimize_on_simplex`], over [`Simplex`] or, with a target, over the
//! [`SimplexSlice`] where P μᵀw equals it.

use crate::error::OptimizeError;
use crate::simplex::{LinearEquality, Simplex, SimplexSlice};
use crate::solver::{OptimizerConfig, minimize_on_simplex};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tangency_risk::{EvaluationConfig, PerformanceMetrics, ReturnModel, WeightVector, evaluate};

/// Optimal weights with their evaluated performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Weights in model asset order
    pub optimal_weights: WeightVector,
    /// `evaluate(optimal_weights)`
    pub performance: PerformanceMetrics,
    /// Solver iterations used
    pub iterations: usize,
}

/// Negative annualized Sharpe ratio and its gradient at `w`.
///
/// With R = P μᵀw − r_f and σ = √(P wᵀΣw):
///
/// ∇(−R/σ) = −Pμ/σ + R · PΣw / σ³
///
/// Zero variance yields a non-finite value.
pub fn negative_sharpe(
    w: &Array1<f64>,
    model: &ReturnModel,
    config: &EvaluationConfig,
) -> (f64, Array1<f64>) {
    let periods = config.periods_per_year;
    let sigma_w = model.covariance().dot(w);
    let variance = w.dot(&sigma_w).max(0.0);
    let volatility = (periods * variance).sqrt();
    let excess = periods * w.dot(model.expected_returns()) - config.risk_free_rate;

    let value = -excess / volatility;
    let gradient = model.expected_returns() * (-periods / volatility)
        + sigma_w * (excess * periods / volatility.powi(3));
    (value, gradient)
}

/// Sharpe-maximizing allocation optimizer
#[derive(Debug, Clone, Default)]
pub struct AllocationOptimizer {
    config: OptimizerConfig,
    evaluation: EvaluationConfig,
}

impl AllocationOptimizer {
    /// Create an optimizer with default solver settings.
    pub fn new(evaluation: EvaluationConfig) -> Self {
        Self {
            config: OptimizerConfig::default(),
            evaluation,
        }
    }

    /// Create an optimizer with explicit solver settings.
    pub const fn with_config(config: OptimizerConfig, evaluation: EvaluationConfig) -> Self {
        Self { config, evaluation }
    }

    /// Solver settings
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Annualization settings
    pub const fn evaluation(&self) -> &EvaluationConfig {
        &self.evaluation
    }

    /// Find the maximum-Sharpe weights for `model`.
    ///
    /// With `target_return` set, the search runs over the slice of the
    /// simplex where the annualized return equals it exactly, so the result
    /// meets the target up to rounding.
    ///
    /// # Errors
    /// [`OptimizeError::Diverged`] when the objective is not finite at the
    /// equal-weight start, the iteration cap is hit, or the target lies
    /// outside the range reachable by long-only portfolios.
    pub fn optimize(
        &self,
        model: &ReturnModel,
        target_return: Option<f64>,
    ) -> Result<OptimizationResult, OptimizeError> {
        self.validate()?;

        let n = model.n_assets();
        let start = WeightVector::equal(n)?;
        let objective = |w: &Array1<f64>| negative_sharpe(w, model, &self.evaluation);

        let solution = match target_return {
            Some(target) => {
                let annual = model.expected_returns() * self.evaluation.periods_per_year;
                let slice = SimplexSlice::new(LinearEquality::new(annual, target))?;
                minimize_on_simplex(objective, start.as_array(), &slice, &self.config)?
            }
            None => minimize_on_simplex(objective, start.as_array(), &Simplex, &self.config)?,
        };

        let weights = WeightVector::from_raw(&solution.x)?;
        let mut result = OptimizationResult {
            performance: evaluate(&weights, model, &self.evaluation)?,
            optimal_weights: weights,
            iterations: solution.iterations,
        };

        if target_return.is_none() {
            let baseline = evaluate(&start, model, &self.evaluation)?;
            if baseline.sharpe_ratio > result.performance.sharpe_ratio {
                result.optimal_weights = start;
                result.performance = baseline;
            }
        }

        tracing::debug!(
            assets = n,
            iterations = result.iterations,
            sharpe = result.performance.sharpe_ratio,
            "allocation optimized"
        );
        Ok(result)
    }

    fn validate(&self) -> Result<(), OptimizeError> {
        self.evaluation.validate()?;
        let c = &self.config;
        if c.max_iterations == 0 {
            return Err(OptimizeError::InvalidConfig(
                "iteration limit must be positive".to_string(),
            ));
        }
        if !(c.tolerance > 0.0 && c.stall_tolerance > 0.0 && c.feasibility_tolerance > 0.0) {
            return Err(OptimizeError::InvalidConfig(
                "tolerances must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
