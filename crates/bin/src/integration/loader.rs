//! CSV and JSON loaders.
//!
//! - prices: wide table, a `date` column (YYYY-MM-DD) followed by one
//!   column per symbol; empty cells are missing observations, and only the
//!   held symbols' columns are read
//! - holdings: `symbol,quantity,price` rows
//! - config: JSON [`AnalysisConfig`], every section optional

use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tangency::risk::{PriceSeries, ReturnsError};
use tangency::{AnalysisConfig, AnalysisError, Holding, Portfolio};

/// Error type for loading CLI inputs.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    /// File could not be opened or read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Malformed JSON config.
    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),
    /// First price column is not `date`.
    #[error("Price table must start with a 'date' column, found '{0}'")]
    MissingDateColumn(String),
    /// Unparseable date cell.
    #[error("Line {line}: invalid date '{value}'")]
    InvalidDate {
        /// 1-based line number
        line: u64,
        /// Cell contents
        value: String,
    },
    /// Unparseable price cell.
    #[error("Line {line}: invalid price '{value}' for {symbol}")]
    InvalidPrice {
        /// 1-based line number
        line: u64,
        /// Column symbol
        symbol: String,
        /// Cell contents
        value: String,
    },
    /// Prices rejected by the price table.
    #[error(transparent)]
    Returns(#[from] ReturnsError),
    /// Holdings rejected by the portfolio.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Read the `held` columns of a wide price table.
///
/// Other columns are skipped before dates are aligned, so gaps in assets
/// that are not held never shorten the history of those that are.
pub(crate) fn read_prices<R: Read>(reader: R, held: &[String]) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut columns = headers.iter();
    match columns.next() {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        other => {
            return Err(LoadError::MissingDateColumn(
                other.unwrap_or_default().to_string(),
            ));
        }
    }
    // (cell index, symbol) of every held column
    let symbols: Vec<(usize, String)> = columns
        .enumerate()
        .filter(|(_, s)| held.iter().any(|h| h.as_str() == *s))
        .map(|(i, s)| (i + 1, s.to_string()))
        .collect();

    let mut observations = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            LoadError::InvalidDate {
                line,
                value: raw_date.to_string(),
            }
        })?;

        for (index, symbol) in &symbols {
            let cell = record.get(*index).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let price: f64 = cell.parse().map_err(|_| LoadError::InvalidPrice {
                line,
                symbol: symbol.clone(),
                value: cell.to_string(),
            })?;
            observations.push((date, symbol.clone(), price));
        }
    }

    let prices = PriceSeries::from_observations(observations)?;
    tracing::debug!(
        symbols = prices.n_assets(),
        dates = prices.n_observations(),
        "price table loaded"
    );
    Ok(prices)
}

/// Read `symbol,quantity,price` holdings.
pub(crate) fn read_holdings<R: Read>(reader: R) -> Result<Portfolio, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let holdings = rdr
        .deserialize::<Holding>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Portfolio::new(holdings)?)
}

/// Load the `held` columns of a price table from disk.
pub(crate) fn load_prices(path: &Path, held: &[String]) -> Result<PriceSeries, LoadError> {
    read_prices(File::open(path)?, held)
}

/// Load holdings from disk.
pub(crate) fn load_holdings(path: &Path) -> Result<Portfolio, LoadError> {
    read_holdings(File::open(path)?)
}

/// Load a JSON config, or the defaults when no path is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, LoadError> {
    match path {
        Some(path) => Ok(serde_json::from_reader(File::open(path)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}
