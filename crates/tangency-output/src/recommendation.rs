//! Rebalancing recommendations.
//!
//! Compares a current allocation with an optimal one and produces a short,
//! ordered list of suggestions:
//!
//! 1. per-asset increase/decrease notes, in the optimal allocation's order,
//!    for weight gaps above the rebalance threshold
//! 2. a note tied to the risk tier (Very High and Low only)
//! 3. a diversification note when the current portfolio is concentrated
//!
//! The list is truncated to a maximum length, keeping that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use tangency_risk::{Allocation, RiskTier};

/// Thresholds for [`generate_recommendations`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Smallest weight gap (strictly exceeded) that triggers a rebalance note
    pub rebalance_threshold: f64,
    /// Fewer distinct current holdings than this triggers a diversification note
    pub min_holdings: usize,
    /// Maximum number of recommendations returned
    pub max_recommendations: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            rebalance_threshold: 0.05,
            min_holdings: 5,
            max_recommendations: 5,
        }
    }
}

/// A single recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Raise the weight of an asset
    Increase {
        /// Asset symbol
        symbol: String,
        /// Change in percentage points
        points: f64,
    },
    /// Cut the weight of an asset
    Decrease {
        /// Asset symbol
        symbol: String,
        /// Change in percentage points
        points: f64,
    },
    /// Portfolio volatility is very high
    AddStableAssets,
    /// Portfolio volatility is low
    ConsiderGrowth,
    /// Too few distinct holdings
    Diversify,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increase { symbol, points } => {
                write!(f, "Consider increasing {symbol} allocation by {points:.1}%")
            }
            Self::Decrease { symbol, points } => {
                write!(f, "Consider decreasing {symbol} allocation by {points:.1}%")
            }
            Self::AddStableAssets => {
                f.write_str("Consider adding more stable assets to reduce risk")
            }
            Self::ConsiderGrowth => {
                f.write_str("Portfolio is conservative; consider growth opportunities")
            }
            Self::Diversify => f.write_str("Consider diversifying across more assets"),
        }
    }
}

/// Build the ordered recommendation list.
///
/// Assets missing from `current` count as weight 0.
pub fn generate_recommendations(
    current: &Allocation,
    optimal: &Allocation,
    risk_tier: RiskTier,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = optimal
        .entries()
        .iter()
        .filter_map(|entry| {
            let held = current.weight(&entry.symbol).unwrap_or(0.0);
            let gap = entry.weight - held;
            if gap.abs() <= config.rebalance_threshold {
                return None;
            }
            let symbol = entry.symbol.clone();
            let points = gap.abs() * 100.0;
            Some(if gap > 0.0 {
                Recommendation::Increase { symbol, points }
            } else {
                Recommendation::Decrease { symbol, points }
            })
        })
        .collect();

    match risk_tier {
        RiskTier::VeryHigh => recommendations.push(Recommendation::AddStableAssets),
        RiskTier::Low => recommendations.push(Recommendation::ConsiderGrowth),
        RiskTier::Medium | RiskTier::High => {}
    }

    if current.holdings_count() < config.min_holdings {
        recommendations.push(Recommendation::Diversify);
    }

    recommendations.truncate(config.max_recommendations);
    recommendations
}

/// Recommendation strings with the default thresholds.
pub fn recommend(current: &Allocation, optimal: &Allocation, risk_tier: RiskTier) -> Vec<String> {
    generate_recommendations(current, optimal, risk_tier, &RecommendationConfig::default())
        .iter()
        .map(ToString::to_string)
        .collect()
}
