//! Portfolio holdings and current weights.

use crate::error::AnalysisError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tangency_risk::{Allocation, WeightVector};

/// A position: quantity held at a current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Asset symbol
    pub symbol: String,
    /// Units held
    pub quantity: f64,
    /// Current price per unit
    pub price: f64,
}

impl Holding {
    /// Create a holding.
    pub fn new(symbol: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    /// Quantity x price
    pub fn market_value(&self) -> f64 {
        self.quantity * self.price
    }
}

/// Validated set of holdings with unique symbols.
///
/// Holding order fixes the asset order of every weight vector and return
/// model derived from the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Holding>", into = "Vec<Holding>")]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    /// Validate `holdings`.
    ///
    /// # Errors
    /// [`AnalysisError::EmptyPortfolio`] for no holdings or zero total value,
    /// [`AnalysisError::InvalidHolding`] for negative or non-finite quantities
    /// and prices, [`AnalysisError::DuplicateSymbol`] for repeated symbols.
    pub fn new(holdings: Vec<Holding>) -> Result<Self, AnalysisError> {
        if holdings.is_empty() {
            return Err(AnalysisError::EmptyPortfolio);
        }

        let mut seen = HashSet::new();
        for h in &holdings {
            if !h.quantity.is_finite() || h.quantity < 0.0 || !h.price.is_finite() || h.price < 0.0
            {
                return Err(AnalysisError::InvalidHolding {
                    symbol: h.symbol.clone(),
                    quantity: h.quantity,
                    price: h.price,
                });
            }
            if !seen.insert(h.symbol.as_str()) {
                return Err(AnalysisError::DuplicateSymbol(h.symbol.clone()));
            }
        }

        let portfolio = Self { holdings };
        if portfolio.total_value() <= 0.0 {
            return Err(AnalysisError::EmptyPortfolio);
        }
        Ok(portfolio)
    }

    /// Holdings in portfolio order
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Symbols in portfolio order
    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }

    /// Sum of market values
    pub fn total_value(&self) -> f64 {
        self.holdings.iter().map(Holding::market_value).sum()
    }

    /// Market-value weights in portfolio order.
    pub fn weights(&self) -> Result<WeightVector, AnalysisError> {
        let values: Array1<f64> = self.holdings.iter().map(Holding::market_value).collect();
        Ok(WeightVector::from_values(&values)?)
    }

    /// Market-value weights labelled by symbol.
    pub fn allocation(&self) -> Result<Allocation, AnalysisError> {
        Ok(Allocation::new(&self.symbols(), &self.weights()?)?)
    }
}

impl TryFrom<Vec<Holding>> for Portfolio {
    type Error = AnalysisError;

    fn try_from(holdings: Vec<Holding>) -> Result<Self, Self::Error> {
        Self::new(holdings)
    }
}

impl From<Portfolio> for Vec<Holding> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.holdings
    }
}
