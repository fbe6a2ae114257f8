//! Price histories and periodic returns
//!
//! A [`PriceSeries`] is a date-ordered table of positive prices, one column
//! per asset. [`compute_returns`] turns it into a [`ReturnMatrix`] of simple
//! period-over-period returns:
//!
//! r_t = (p_t - p_{t-1}) / p_{t-1}
//!
//! The first period has no predecessor and is dropped, so the return matrix
//! always has one row fewer than the price table.

use chrono::NaiveDate;
use ndarray::{Array1, Array2, Axis};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Minimum number of price observations needed to produce one return.
pub const MIN_PRICE_OBSERVATIONS: usize = 2;

/// Errors raised while building price tables or deriving returns
#[derive(Debug, Error)]
pub enum ReturnsError {
    /// Too few price observations to compute a return
    #[error("Insufficient data for {symbol}: need at least {required} prices, got {actual}")]
    InsufficientData {
        /// Asset with the fewest observations
        symbol: String,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A price is zero, negative, or not finite
    #[error("Invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        /// Asset symbol
        symbol: String,
        /// Observation date
        date: NaiveDate,
        /// Offending price
        price: f64,
    },

    /// Dates are not strictly increasing
    #[error("Dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates {
        /// Earlier row
        previous: NaiveDate,
        /// Row that breaks the ordering
        next: NaiveDate,
    },

    /// No assets in the table
    #[error("Price table has no assets")]
    EmptyUniverse,

    /// Requested symbol is not a column of the table
    #[error("Symbol not found in price table: {0}")]
    MissingSymbol(String),

    /// Table shape does not match its labels
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

/// Date x symbol table of prices
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    prices: Array2<f64>,
}

impl PriceSeries {
    /// Create a price table from aligned rows.
    ///
    /// `prices` must have one row per date and one column per symbol. Dates
    /// must be strictly increasing and every price positive and finite.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        prices: Array2<f64>,
    ) -> Result<Self, ReturnsError> {
        if symbols.is_empty() {
            return Err(ReturnsError::EmptyUniverse);
        }
        if prices.nrows() != dates.len() {
            return Err(ReturnsError::DimensionMismatch {
                expected: dates.len(),
                actual: prices.nrows(),
            });
        }
        if prices.ncols() != symbols.len() {
            return Err(ReturnsError::DimensionMismatch {
                expected: symbols.len(),
                actual: prices.ncols(),
            });
        }

        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ReturnsError::UnorderedDates {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        for ((row, col), &price) in prices.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(ReturnsError::InvalidPrice {
                    symbol: symbols[col].clone(),
                    date: dates[row],
                    price,
                });
            }
        }

        Ok(Self {
            dates,
            symbols,
            prices,
        })
    }

    /// Assemble a price table from loose `(date, symbol, price)` observations.
    ///
    /// Only dates observed for every symbol are kept, so a gap in one asset
    /// drops that date for all assets. Symbols keep the order in which they
    /// first appear. A repeated `(date, symbol)` pair keeps the last price.
    pub fn from_observations<I, S>(observations: I) -> Result<Self, ReturnsError>
    where
        I: IntoIterator<Item = (NaiveDate, S, f64)>,
        S: Into<String>,
    {
        let mut symbols: Vec<String> = Vec::new();
        let mut columns: HashMap<String, BTreeMap<NaiveDate, f64>> = HashMap::new();

        for (date, symbol, price) in observations {
            let symbol = symbol.into();
            if !columns.contains_key(&symbol) {
                symbols.push(symbol.clone());
            }
            columns.entry(symbol).or_default().insert(date, price);
        }

        if symbols.is_empty() {
            return Err(ReturnsError::EmptyUniverse);
        }

        let mut common: BTreeSet<NaiveDate> = columns[&symbols[0]].keys().copied().collect();
        for symbol in &symbols[1..] {
            let dates = &columns[symbol];
            common.retain(|d| dates.contains_key(d));
        }

        if common.len() < MIN_PRICE_OBSERVATIONS {
            // Report the asset that constrains the overlap the most
            let sparsest = symbols
                .iter()
                .min_by_key(|s| columns[*s].len())
                .cloned()
                .unwrap_or_default();
            return Err(ReturnsError::InsufficientData {
                symbol: sparsest,
                required: MIN_PRICE_OBSERVATIONS,
                actual: common.len(),
            });
        }

        let dates: Vec<NaiveDate> = common.into_iter().collect();
        let mut prices = Array2::<f64>::zeros((dates.len(), symbols.len()));
        for (col, symbol) in symbols.iter().enumerate() {
            let column = &columns[symbol];
            for (row, date) in dates.iter().enumerate() {
                prices[[row, col]] = column[date];
            }
        }

        Self::new(dates, symbols, prices)
    }

    /// Restrict the table to `symbols`, in the given order.
    pub fn select<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Self, ReturnsError> {
        let mut indices = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref();
            let idx = self
                .symbols
                .iter()
                .position(|s| s == symbol)
                .ok_or_else(|| ReturnsError::MissingSymbol(symbol.to_string()))?;
            indices.push(idx);
        }
        if indices.is_empty() {
            return Err(ReturnsError::EmptyUniverse);
        }

        Ok(Self {
            dates: self.dates.clone(),
            symbols: indices.iter().map(|&i| self.symbols[i].clone()).collect(),
            prices: self.prices.select(Axis(1), &indices),
        })
    }

    /// Observation dates, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset symbols, in column order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Raw price matrix (dates x symbols)
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Number of dates
    pub fn n_observations(&self) -> usize {
        self.dates.len()
    }

    /// Number of assets
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }
}

/// Periodic simple returns (periods x assets)
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Wrap an already computed return matrix.
    ///
    /// Useful when returns come from somewhere other than a price table.
    /// Values are not checked here; non-finite entries are rejected when
    /// the covariance is estimated.
    pub fn from_values(symbols: Vec<String>, values: Array2<f64>) -> Result<Self, ReturnsError> {
        if symbols.is_empty() {
            return Err(ReturnsError::EmptyUniverse);
        }
        if values.ncols() != symbols.len() {
            return Err(ReturnsError::DimensionMismatch {
                expected: symbols.len(),
                actual: values.ncols(),
            });
        }
        if values.nrows() == 0 {
            return Err(ReturnsError::InsufficientData {
                symbol: symbols[0].clone(),
                required: 1,
                actual: 0,
            });
        }
        let dates = Vec::new();
        Ok(Self {
            dates,
            symbols,
            values,
        })
    }

    /// Period end dates (empty when built from raw values)
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset symbols, in column order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Return values (periods x assets)
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of return periods
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of assets
    pub fn n_assets(&self) -> usize {
        self.values.ncols()
    }
}

/// Compute simple period-over-period returns from a price table.
///
/// # Errors
/// Returns [`ReturnsError::InsufficientData`] when the table holds fewer than
/// two observations.
pub fn compute_returns(prices: &PriceSeries) -> Result<ReturnMatrix, ReturnsError> {
    let n_obs = prices.n_observations();
    if n_obs < MIN_PRICE_OBSERVATIONS {
        return Err(ReturnsError::InsufficientData {
            symbol: prices.symbols[0].clone(),
            required: MIN_PRICE_OBSERVATIONS,
            actual: n_obs,
        });
    }

    let p = &prices.prices;
    let previous = p.slice(ndarray::s![..-1, ..]);
    let current = p.slice(ndarray::s![1.., ..]);
    let values = (&current - &previous) / &previous;

    Ok(ReturnMatrix {
        dates: prices.dates[1..].to_vec(),
        symbols: prices.symbols.clone(),
        values,
    })
}

/// Per-asset arithmetic mean of periodic returns.
pub fn expected_returns(returns: &ReturnMatrix) -> Array1<f64> {
    let n = returns.n_periods() as f64;
    returns.values.sum_axis(Axis(0)) / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_prices() -> PriceSeries {
        PriceSeries::new(
            vec![day(1), day(2), day(3), day(4)],
            vec!["AAPL".to_string(), "GOOGL".to_string()],
            array![
                [100.0, 1000.0],
                [105.0, 1020.0],
                [103.0, 1010.0],
                [108.0, 1040.0]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_returns_drop_first_row() {
        let returns = compute_returns(&sample_prices()).unwrap();

        assert_eq!(returns.n_periods(), 3);
        assert_eq!(returns.n_assets(), 2);
        assert_eq!(returns.symbols(), &["AAPL".to_string(), "GOOGL".to_string()]);
        assert_eq!(returns.dates(), &[day(2), day(3), day(4)]);

        assert_relative_eq!(returns.values()[[0, 0]], 0.05, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[[1, 0]], -2.0 / 105.0, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[[2, 1]], 30.0 / 1010.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_returns_is_sample_mean() {
        let returns = ReturnMatrix::from_values(
            vec!["AAPL".to_string(), "GOOGL".to_string()],
            array![[0.01, 0.015], [0.02, 0.01], [-0.01, 0.02]],
        )
        .unwrap();

        let mu = expected_returns(&returns);
        assert_eq!(mu.len(), 2);
        assert_relative_eq!(mu[0], 0.02 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(mu[1], 0.015, epsilon = 1e-12);
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let prices = PriceSeries::new(
            vec![day(1)],
            vec!["AAPL".to_string()],
            array![[100.0]],
        )
        .unwrap();

        let err = compute_returns(&prices).unwrap_err();
        assert!(matches!(
            err,
            ReturnsError::InsufficientData {
                required: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = PriceSeries::new(
            vec![day(1), day(2)],
            vec!["AAPL".to_string()],
            array![[100.0], [0.0]],
        )
        .unwrap_err();
        assert!(matches!(err, ReturnsError::InvalidPrice { .. }));
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let err = PriceSeries::new(
            vec![day(2), day(1)],
            vec!["AAPL".to_string()],
            array![[100.0], [101.0]],
        )
        .unwrap_err();
        assert!(matches!(err, ReturnsError::UnorderedDates { .. }));
    }

    #[test]
    fn test_from_observations_drops_unshared_dates() {
        let prices = PriceSeries::from_observations(vec![
            (day(1), "AAPL", 100.0),
            (day(2), "AAPL", 101.0),
            (day(3), "AAPL", 102.0),
            (day(1), "MSFT", 300.0),
            (day(3), "MSFT", 303.0),
            (day(4), "MSFT", 306.0),
        ])
        .unwrap();

        assert_eq!(prices.dates(), &[day(1), day(3)]);
        assert_eq!(prices.symbols(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_relative_eq!(prices.prices()[[1, 0]], 102.0);
        assert_relative_eq!(prices.prices()[[1, 1]], 303.0);
    }

    #[test]
    fn test_from_observations_without_overlap() {
        let err = PriceSeries::from_observations(vec![
            (day(1), "AAPL", 100.0),
            (day(2), "AAPL", 101.0),
            (day(3), "MSFT", 300.0),
        ])
        .unwrap_err();

        match err {
            ReturnsError::InsufficientData { symbol, actual, .. } => {
                assert_eq!(symbol, "MSFT");
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_reorders_columns() {
        let prices = sample_prices();
        let selected = prices.select(&["GOOGL", "AAPL"]).unwrap();

        assert_eq!(selected.symbols(), &["GOOGL".to_string(), "AAPL".to_string()]);
        assert_relative_eq!(selected.prices()[[0, 0]], 1000.0);
        assert_relative_eq!(selected.prices()[[0, 1]], 100.0);

        let err = prices.select(&["TSLA"]).unwrap_err();
        assert!(matches!(err, ReturnsError::MissingSymbol(s) if s == "TSLA"));
    }
}
