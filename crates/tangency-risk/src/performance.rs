//! Annualized performance of a weight vector
//!
//! - annualized return = (w · μ) × P
//! - annualized volatility = √(wᵀΣw) × √P
//! - Sharpe ratio = (annualized return − r_f) / annualized volatility
//!
//! where P is the number of periods per year and r_f the risk-free rate.
//! Both are explicit parameters in [`EvaluationConfig`].

use crate::model::ReturnModel;
use crate::weights::WeightVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trading days per year
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Default annual risk-free rate
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Performance evaluation errors
#[derive(Debug, Error, PartialEq)]
pub enum PerformanceError {
    /// Volatility is zero, so the Sharpe ratio has no value
    #[error("Sharpe ratio is undefined: annualized volatility is {volatility}")]
    UndefinedSharpe {
        /// Annualized volatility that was computed
        volatility: f64,
    },

    /// Weights and model cover different numbers of assets
    #[error("Dimension mismatch: model has {expected} assets, weights have {actual}")]
    DimensionMismatch {
        /// Assets in the model
        expected: usize,
        /// Entries in the weight vector
        actual: usize,
    },

    /// Evaluation configuration is unusable
    #[error("Invalid evaluation config: {0}")]
    InvalidConfig(String),
}

/// Annualization and risk-free settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Return periods per year (252 for daily data)
    pub periods_per_year: f64,
    /// Annual risk-free rate
    pub risk_free_rate: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl EvaluationConfig {
    /// Check that the settings can annualize anything.
    pub fn validate(&self) -> Result<(), PerformanceError> {
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(PerformanceError::InvalidConfig(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(PerformanceError::InvalidConfig(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Annualized return, volatility and Sharpe ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Annualized expected return
    pub annualized_return: f64,
    /// Annualized volatility
    pub annualized_volatility: f64,
    /// Excess return per unit of volatility
    pub sharpe_ratio: f64,
}

/// Evaluate `weights` against `model`.
///
/// # Errors
/// [`PerformanceError::UndefinedSharpe`] when the portfolio has zero (or
/// non-finite) volatility; [`PerformanceError::DimensionMismatch`] when the
/// weights and the model disagree on the number of assets.
pub fn evaluate(
    weights: &WeightVector,
    model: &ReturnModel,
    config: &EvaluationConfig,
) -> Result<PerformanceMetrics, PerformanceError> {
    if weights.len() != model.n_assets() {
        return Err(PerformanceError::DimensionMismatch {
            expected: model.n_assets(),
            actual: weights.len(),
        });
    }
    config.validate()?;

    let w = weights.as_array();
    let annualized_return = w.dot(model.expected_returns()) * config.periods_per_year;
    // Shrinkage keeps Σ PSD; clamp rounding noise below zero
    let variance = model.portfolio_variance(w).max(0.0);
    let annualized_volatility = variance.sqrt() * config.periods_per_year.sqrt();

    if !annualized_volatility.is_finite() || annualized_volatility == 0.0 {
        return Err(PerformanceError::UndefinedSharpe {
            volatility: annualized_volatility,
        });
    }

    Ok(PerformanceMetrics {
        annualized_return,
        annualized_volatility,
        sharpe_ratio: (annualized_return - config.risk_free_rate) / annualized_volatility,
    })
}
