//! Long-only, fully invested weight vectors

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance on `sum(weights) == 1`
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Errors raised when a weight vector breaks the long-only invariants
#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    /// No weights given
    #[error("Weight vector is empty")]
    Empty,

    /// A weight is negative, above one, or not finite
    #[error("Weight {index} is out of bounds: {value}")]
    OutOfBounds {
        /// Position in the vector
        index: usize,
        /// Offending weight
        value: f64,
    },

    /// Weights do not sum to one
    #[error("Weights sum to {sum}, expected 1")]
    NotNormalized {
        /// Actual sum
        sum: f64,
    },

    /// Symbols and weights have different lengths
    #[error("Dimension mismatch: {symbols} symbols for {weights} weights")]
    DimensionMismatch {
        /// Number of symbols
        symbols: usize,
        /// Number of weights
        weights: usize,
    },
}

/// Non-negative weights summing to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WeightVector(Array1<f64>);

impl WeightVector {
    /// Validate and wrap `weights`.
    pub fn new(weights: Array1<f64>) -> Result<Self, WeightError> {
        if weights.is_empty() {
            return Err(WeightError::Empty);
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(WeightError::OutOfBounds { index, value });
            }
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::NotNormalized { sum });
        }
        Ok(Self(weights))
    }

    /// Equal weighting over `n` assets.
    pub fn equal(n: usize) -> Result<Self, WeightError> {
        if n == 0 {
            return Err(WeightError::Empty);
        }
        Ok(Self(Array1::from_elem(n, 1.0 / n as f64)))
    }

    /// Clip raw solver output into `[0, 1]` and rescale to sum to one.
    ///
    /// Only tiny tolerance violations are expected here; a vector with no
    /// positive mass or a non-finite entry is rejected.
    pub fn from_raw(raw: &Array1<f64>) -> Result<Self, WeightError> {
        if raw.is_empty() {
            return Err(WeightError::Empty);
        }
        if let Some((index, &value)) = raw.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(WeightError::OutOfBounds { index, value });
        }
        let clipped = raw.mapv(|w| w.clamp(0.0, 1.0));
        let sum = clipped.sum();
        if sum <= 0.0 {
            return Err(WeightError::NotNormalized { sum });
        }
        Self::new(clipped / sum)
    }

    /// Weights from position values (quantity x price per asset).
    pub fn from_values(values: &Array1<f64>) -> Result<Self, WeightError> {
        if values.is_empty() {
            return Err(WeightError::Empty);
        }
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(WeightError::OutOfBounds { index, value });
        }
        let total = values.sum();
        if total <= 0.0 {
            return Err(WeightError::NotNormalized { sum: total });
        }
        Self::new(values / total)
    }

    /// Underlying weights
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a valid vector
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the weights
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

impl TryFrom<Vec<f64>> for WeightVector {
    type Error = WeightError;

    fn try_from(weights: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(Array1::from_vec(weights))
    }
}

impl From<WeightVector> for Vec<f64> {
    fn from(weights: WeightVector) -> Self {
        weights.0.to_vec()
    }
}

/// One labelled weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Asset symbol
    pub symbol: String,
    /// Portfolio weight in [0, 1]
    pub weight: f64,
}

/// Symbol-labelled weight vector, preserving asset order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

impl Allocation {
    /// Label `weights` with `symbols` (same order, same length).
    pub fn new(symbols: &[String], weights: &WeightVector) -> Result<Self, WeightError> {
        if symbols.len() != weights.len() {
            return Err(WeightError::DimensionMismatch {
                symbols: symbols.len(),
                weights: weights.len(),
            });
        }
        let entries = symbols
            .iter()
            .zip(weights.iter())
            .map(|(symbol, &weight)| AllocationEntry {
                symbol: symbol.clone(),
                weight,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Build directly from `(symbol, weight)` pairs.
    ///
    /// No normalization is applied; used for hand-written allocations.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(symbol, weight)| AllocationEntry {
                symbol: symbol.into(),
                weight,
            })
            .collect();
        Self { entries }
    }

    /// Weight of `symbol`, if present
    pub fn weight(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.weight)
    }

    /// Entries in asset order
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Number of assets with strictly positive weight
    pub fn holdings_count(&self) -> usize {
        self.entries.iter().filter(|e| e.weight > 0.0).count()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_equal_weights() {
        let w = WeightVector::equal(4).unwrap();
        assert_eq!(w.len(), 4);
        for &x in w.iter() {
            assert_relative_eq!(x, 0.25);
        }
        assert_eq!(WeightVector::equal(0), Err(WeightError::Empty));
    }

    #[rstest]
    #[case(array![0.5, 0.6])]
    #[case(array![1.2, -0.2])]
    #[case(array![f64::NAN, 1.0])]
    fn test_rejects_invalid(#[case] weights: Array1<f64>) {
        assert!(WeightVector::new(weights).is_err());
    }

    #[test]
    fn test_from_raw_repairs_tolerance_violations() {
        let raw = array![0.6000001, 0.4, -1e-12];
        let w = WeightVector::from_raw(&raw).unwrap();

        assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert_relative_eq!(w.as_array().sum(), 1.0, epsilon = 1e-12);
        assert_eq!(w.as_array()[2], 0.0);
    }

    #[test]
    fn test_from_values() {
        let w = WeightVector::from_values(&array![300.0, 100.0]).unwrap();
        assert_relative_eq!(w.as_array()[0], 0.75);
        assert_relative_eq!(w.as_array()[1], 0.25);

        assert!(WeightVector::from_values(&array![0.0, 0.0]).is_err());
        assert!(WeightVector::from_values(&array![-1.0, 2.0]).is_err());
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let w = WeightVector::equal(2).unwrap();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "[0.5,0.5]");

        let bad: Result<WeightVector, _> = serde_json::from_str("[0.9, 0.9]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_allocation_lookup() {
        let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let weights = WeightVector::new(array![0.5, 0.5, 0.0]).unwrap();
        let allocation = Allocation::new(&symbols, &weights).unwrap();

        assert_eq!(allocation.weight("B"), Some(0.5));
        assert_eq!(allocation.weight("Z"), None);
        assert_eq!(allocation.holdings_count(), 2);
        assert_eq!(allocation.entries()[2].symbol, "C");

        let err = Allocation::new(&symbols[..2], &weights).unwrap_err();
        assert!(matches!(err, WeightError::DimensionMismatch { .. }));
    }
}
