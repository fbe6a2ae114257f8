//! Timestamped report envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required field not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// A report wrapping one analysis or optimization result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title, e.g. the command that produced it.
    pub title: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Symbols covered, in portfolio order.
    pub symbols: Vec<String>,

    /// Report contents (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report stamped with the current time.
    pub fn new(title: String, symbols: Vec<String>, contents: serde_json::Value) -> Self {
        Self {
            title,
            timestamp: Utc::now(),
            symbols,
            contents,
        }
    }

    /// Wrap any serializable value.
    pub fn from_serializable<T: Serialize>(
        title: String,
        symbols: Vec<String>,
        value: &T,
    ) -> Result<Self, ReportError> {
        Ok(Self::new(title, symbols, serde_json::to_value(value)?))
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    symbols: Vec<String>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the covered symbols.
    pub fn symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let title = self.title.ok_or(ReportError::MissingField("title"))?;
        let contents = self.contents.ok_or(ReportError::MissingField("contents"))?;
        Ok(Report::new(title, self.symbols, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = Report::new(
            "analyze".to_string(),
            vec!["AAPL".to_string()],
            serde_json::json!({"test": "data"}),
        );

        assert_eq!(report.title, "analyze");
        assert_eq!(report.symbols, vec!["AAPL"]);
        assert!(report.to_json().unwrap().contains("\"timestamp\""));
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .title("optimize")
            .symbols(vec!["MSFT".to_string(), "TLT".to_string()])
            .contents(serde_json::json!({"key": "value"}))
            .build()
            .unwrap();

        assert_eq!(report.title, "optimize");
        assert_eq!(report.symbols.len(), 2);
        assert_eq!(report.contents["key"], "value");
    }

    #[test]
    fn test_builder_requires_contents() {
        let err = ReportBuilder::new().title("empty").build().unwrap_err();
        assert!(matches!(err, ReportError::MissingField("contents")));
    }
}
