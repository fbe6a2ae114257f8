//! Diversification score and risk tiers
//!
//! The diversification score compares the portfolio variance with the
//! weighted average of the individual asset variances:
//!
//! D = 1 − (wᵀΣw) / (Σ_i w_i Σ_ii)
//!
//! A single-asset portfolio scores 0. Imperfectly correlated holdings pull
//! the portfolio variance below the average and push the score toward 1.
//! Negative scores can only come from correlation structures that
//! concentrate risk; they are clamped to 0, which hides that case.

use crate::model::ReturnModel;
use crate::performance::{EvaluationConfig, PerformanceError, evaluate};
use crate::weights::WeightVector;
use derive_more::Display;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Upper volatility bound of the Low tier
pub const LOW_VOLATILITY_CEILING: f64 = 0.10;
/// Upper volatility bound of the Medium tier
pub const MEDIUM_VOLATILITY_CEILING: f64 = 0.20;
/// Upper volatility bound of the High tier
pub const HIGH_VOLATILITY_CEILING: f64 = 0.30;

/// Categorical risk level derived from annualized volatility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum RiskTier {
    /// Volatility below 10%
    #[display("Low")]
    Low,
    /// Volatility in [10%, 20%)
    #[display("Medium")]
    Medium,
    /// Volatility in [20%, 30%)
    #[display("High")]
    High,
    /// Volatility of 30% or more
    #[display("Very High")]
    #[serde(rename = "Very High")]
    VeryHigh,
}

/// Map annualized volatility to a [`RiskTier`].
///
/// Bounds are inclusive below and exclusive above.
pub fn risk_tier(volatility: f64) -> RiskTier {
    if volatility < LOW_VOLATILITY_CEILING {
        RiskTier::Low
    } else if volatility < MEDIUM_VOLATILITY_CEILING {
        RiskTier::Medium
    } else if volatility < HIGH_VOLATILITY_CEILING {
        RiskTier::High
    } else {
        RiskTier::VeryHigh
    }
}

/// Diversification score in [0, 1].
///
/// Returns 0 when the weighted-average variance is 0.
pub fn diversification_score(weights: &WeightVector, covariance: &Array2<f64>) -> f64 {
    let w = weights.as_array();
    let portfolio_variance = w.dot(&covariance.dot(w));
    let weighted_average_variance = w.dot(&covariance.diag());

    if weighted_average_variance == 0.0 {
        return 0.0;
    }

    let score = 1.0 - portfolio_variance / weighted_average_variance;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Risk tier plus diversification score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Tier of the annualized volatility
    pub risk_tier: RiskTier,
    /// Diversification score in [0, 1]
    pub diversification_score: f64,
}

/// Assess `weights` against `model`.
pub fn assess(
    weights: &WeightVector,
    model: &ReturnModel,
    config: &EvaluationConfig,
) -> Result<RiskAssessment, PerformanceError> {
    let metrics = evaluate(weights, model, config)?;
    Ok(RiskAssessment {
        risk_tier: risk_tier(metrics.annualized_volatility),
        diversification_score: diversification_score(weights, model.covariance()),
    })
}
