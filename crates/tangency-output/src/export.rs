//! CSV and JSON export of allocations, analyses and optimization reports.

use crate::summary::{OptimizationReport, PortfolioAnalysis};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tangency_risk::Allocation;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer produced bytes that are not UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize `value` as compact or pretty JSON.
fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, ExportError> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// One `metric,value` CSV row.
#[derive(Debug, Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: String,
}

/// One row of an optimization report in CSV form.
#[derive(Debug, Serialize)]
struct RebalanceRow<'a> {
    symbol: &'a str,
    current_weight: f64,
    recommended_weight: f64,
    change: f64,
}

impl Exporter for Allocation {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for entry in self.entries() {
                    wtr.serialize(entry)?;
                }
                finish(wtr)
            }
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for PortfolioAnalysis {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let metrics = [
                    ("total_value", self.total_value.to_string()),
                    ("expected_return", self.expected_return.to_string()),
                    ("volatility", self.volatility.to_string()),
                    ("sharpe_ratio", self.sharpe_ratio.to_string()),
                    ("diversification_score", self.diversification_score.to_string()),
                    ("risk_tier", self.risk_tier.to_string()),
                ];
                for (metric, value) in metrics {
                    wtr.serialize(MetricRow { metric, value })?;
                }
                for rec in &self.recommendations {
                    wtr.serialize(MetricRow {
                        metric: "recommendation",
                        value: rec.clone(),
                    })?;
                }
                finish(wtr)
            }
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for OptimizationReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for (symbol, current, recommended) in self.rows() {
                    wtr.serialize(RebalanceRow {
                        symbol: &symbol,
                        current_weight: current,
                        recommended_weight: recommended,
                        change: recommended - current,
                    })?;
                }
                finish(wtr)
            }
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}
