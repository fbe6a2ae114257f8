//! Errors of the analysis pipeline.

use tangency_optimize::OptimizeError;
use tangency_risk::{PerformanceError, ReturnModelError, ReturnsError, WeightError};
use thiserror::Error;

/// Everything that can stop an analysis or optimization run
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No holdings, or holdings worth nothing
    #[error("Portfolio has no holdings with positive value")]
    EmptyPortfolio,

    /// Negative or non-finite quantity or price
    #[error("Invalid holding {symbol}: quantity {quantity}, price {price}")]
    InvalidHolding {
        /// Asset symbol
        symbol: String,
        /// Quantity given
        quantity: f64,
        /// Price given
        price: f64,
    },

    /// Same symbol held twice
    #[error("Duplicate holding: {0}")]
    DuplicateSymbol(String),

    /// Price history problem
    #[error(transparent)]
    Returns(#[from] ReturnsError),

    /// Return model could not be fitted
    #[error(transparent)]
    Model(#[from] ReturnModelError),

    /// Current weights could not be evaluated
    #[error(transparent)]
    Performance(#[from] PerformanceError),

    /// Optimizer failed
    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    /// Weights violate the long-only invariants
    #[error("Invalid weights: {0}")]
    InvalidWeights(#[from] WeightError),
}
