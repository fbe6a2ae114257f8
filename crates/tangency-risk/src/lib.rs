#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod diversification;
pub mod model;
pub mod performance;
pub mod returns;
pub mod weights;

// Re-export main types
pub use covariance::{
    CovarianceError, CovarianceEstimator, LedoitWolfEstimator, shrinkage_covariance,
};
pub use diversification::{RiskAssessment, RiskTier, assess, diversification_score, risk_tier};
pub use model::{ReturnModel, ReturnModelError};
pub use performance::{EvaluationConfig, PerformanceError, PerformanceMetrics, evaluate};
pub use returns::{PriceSeries, ReturnMatrix, ReturnsError, compute_returns, expected_returns};
pub use weights::{Allocation, AllocationEntry, WeightError, WeightVector};
