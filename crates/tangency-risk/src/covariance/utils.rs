//! Matrix diagnostics for covariance estimates
//!
//! Symmetric eigendecomposition, positive-definiteness checks and condition
//! numbers. The optimizer needs a well-conditioned, positive-definite
//! covariance; these helpers verify that a model actually has one.

use super::CovarianceError;
use ndarray::{Array1, Array2};

/// Maximum number of full Jacobi sweeps
const MAX_SWEEPS: usize = 64;

/// Off-diagonal mass below which the matrix is considered diagonal
const SWEEP_TOLERANCE: f64 = 1e-22;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Check if a matrix is positive definite
///
/// A matrix is positive definite if all eigenvalues are strictly positive.
pub fn is_positive_definite(cov: &Array2<f64>) -> bool {
    is_positive_definite_with_tolerance(cov, 0.0)
}

/// Check if all eigenvalues exceed `tolerance`
pub fn is_positive_definite_with_tolerance(cov: &Array2<f64>, tolerance: f64) -> bool {
    if cov.nrows() != cov.ncols() {
        return false;
    }

    // Quick check: diagonal elements must be positive
    if cov.diag().iter().any(|&v| v <= 0.0) {
        return false;
    }

    match jacobi_eigendecomp(cov) {
        Ok(decomp) => decomp.eigenvalues.iter().all(|&v| v > tolerance),
        Err(_) => false,
    }
}

/// Ratio of the largest to the smallest eigenvalue
///
/// Infinity when the smallest eigenvalue is (numerically) zero or negative.
pub fn condition_number(cov: &Array2<f64>) -> f64 {
    let Ok(decomp) = jacobi_eigendecomp(cov) else {
        return f64::INFINITY;
    };

    let n = decomp.eigenvalues.len();
    if n == 0 {
        return f64::INFINITY;
    }
    let max_eig = decomp.eigenvalues[0];
    let min_eig = decomp.eigenvalues[n - 1];

    if min_eig <= max_eig.abs() * f64::EPSILON {
        f64::INFINITY
    } else {
        max_eig / min_eig
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix
///
/// Sweeps every off-diagonal pair in turn until the off-diagonal mass
/// vanishes. Accurate for the small dense matrices seen in portfolio work.
pub fn jacobi_eigendecomp(matrix: &Array2<f64>) -> Result<EigenDecomposition, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let scale: f64 = matrix.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..MAX_SWEEPS {
        if off_diagonal_mass(&a) <= SWEEP_TOLERANCE * scale {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in order.iter().enumerate() {
        eigenvectors.column_mut(new_idx).assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

fn off_diagonal_mass(a: &Array2<f64>) -> f64 {
    a.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, &x)| x * x)
        .sum()
}

/// Zero out a[p, q] with a single Jacobi rotation
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
    let apq = a[[p, q]];
    if apq == 0.0 {
        return;
    }

    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    let n = a.nrows();
    for k in 0..n {
        let akp = a[[k, p]];
        let akq = a[[k, q]];
        a[[k, p]] = c * akp - s * akq;
        a[[k, q]] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[[p, k]];
        let aqk = a[[q, k]];
        a[[p, k]] = c * apk - s * aqk;
        a[[q, k]] = s * apk + c * aqk;
    }
    for k in 0..n {
        let vkp = v[[k, p]];
        let vkq = v[[k, q]];
        v[[k, p]] = c * vkp - s * vkq;
        v[[k, q]] = s * vkp + c * vkq;
    }
}
