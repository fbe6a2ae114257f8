#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod error;
pub mod holdings;

// Re-export main types from sub-crates
pub use tangency_optimize as optimize;
pub use tangency_output as output;
pub use tangency_risk as risk;

pub use analysis::{AnalysisConfig, PortfolioAnalyzer};
pub use error::AnalysisError;
pub use holdings::{Holding, Portfolio};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
