//! Constrained minimization over the probability simplex
//!
//! Minimizes a smooth objective f(w) over a [`FeasibleSet`]: either Δ
//! itself (w_i ≥ 0, Σ w_i = 1) or Δ cut by a linear equality aᵀw = b. Both
//! are enforced exactly by Euclidean projection, so every iterate is
//! feasible.
//!
//! The iteration is projected gradient descent with Barzilai-Borwein trial
//! steps and Armijo backtracking along the projection arc. Every accepted
//! step strictly decreases the objective, so the result is never worse than
//! the (projected) starting point.
//!
//! Convergence is measured by the projected step ‖P(x − ∇f) − x‖_∞ scaled
//! by max(1, ‖∇f‖_∞). Near a minimizer the objective eventually stops
//! changing in floating point; a point that has reached that floor is
//! accepted once the projected step is below `stall_tolerance`.
//!
//! Objectives are plain closures returning the value and the gradient.

use crate::simplex::FeasibleSet;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sufficient-decrease constant for the Armijo test
const ARMIJO: f64 = 1e-4;

/// Smallest trial step before the line search gives up
const MIN_STEP: f64 = 1e-20;

/// Largest Barzilai-Borwein step
const MAX_STEP: f64 = 1e8;

/// Relative decrease below which the objective counts as unchanged
const FLAT_DECREASE: f64 = 1e-14;

/// Solver failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// Objective or gradient is NaN or infinite at an iterate
    #[error("Objective is not finite at iteration {iteration}")]
    NonFinite {
        /// Iteration at which it happened
        iteration: usize,
    },

    /// Iteration budget exhausted before convergence
    #[error("No convergence after {iterations} iterations (stationarity {stationarity:e})")]
    MaxIterations {
        /// Iterations used
        iterations: usize,
        /// Last projected-gradient norm
        stationarity: f64,
    },

    /// Line search could not make progress away from a stationary point
    #[error("Line search failed at iteration {iteration} (stationarity {stationarity:e})")]
    LineSearchFailed {
        /// Iteration at which it happened
        iteration: usize,
        /// Projected-gradient norm at the stuck iterate
        stationarity: f64,
    },

    /// The equality cannot be met by any point of the simplex
    #[error("Target {target} outside reachable range [{lowest}, {highest}]")]
    Infeasible {
        /// Requested right-hand side
        target: f64,
        /// Smallest coefficient
        lowest: f64,
        /// Largest coefficient
        highest: f64,
    },

    /// Final point violates the equality by more than the tolerance
    #[error("Equality constraint violated by {violation:e}")]
    ConstraintViolated {
        /// Absolute residual
        violation: f64,
    },

    /// Constraint or start point of the wrong length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Problem dimension
        expected: usize,
        /// Offending length
        actual: usize,
    },
}

/// Solver settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Projected-gradient iteration cap
    pub max_iterations: usize,
    /// Scaled projected-gradient norm at which the solve has converged
    pub tolerance: f64,
    /// Projected-gradient norm accepted once the objective stops moving
    pub stall_tolerance: f64,
    /// Largest acceptable equality residual
    pub feasibility_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
            stall_tolerance: 1e-6,
            feasibility_tolerance: 1e-8,
        }
    }
}

/// Solver output
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Minimizer found
    pub x: Array1<f64>,
    /// Objective value at `x`
    pub objective: f64,
    /// Projected-gradient iterations used
    pub iterations: usize,
    /// Absolute equality residual at `x`
    pub constraint_violation: f64,
}

/// Minimize `objective` over `set`.
///
/// `objective` returns the value and gradient at a point. The start point
/// is projected onto `set` first.
pub fn minimize_on_simplex<F, S>(
    objective: F,
    start: &Array1<f64>,
    set: &S,
    config: &OptimizerConfig,
) -> Result<Solution, SolverError>
where
    F: Fn(&Array1<f64>) -> (f64, Array1<f64>),
    S: FeasibleSet + ?Sized,
{
    if let Some(expected) = set.dimension().filter(|&d| d != start.len()) {
        return Err(SolverError::DimensionMismatch {
            expected,
            actual: start.len(),
        });
    }

    let x0 = set.project(start);
    let (x, value, iterations) = projected_gradient(&objective, set, x0, config)?;

    let violation = set.violation(&x);
    if violation > config.feasibility_tolerance {
        return Err(SolverError::ConstraintViolated { violation });
    }

    tracing::debug!(iterations, objective = value, violation, "solver converged");
    Ok(Solution {
        x,
        objective: value,
        iterations,
        constraint_violation: violation,
    })
}

/// ‖P(x − g) − x‖_∞, zero exactly at stationary points
fn projected_step_norm<S>(set: &S, x: &Array1<f64>, gradient: &Array1<f64>) -> f64
where
    S: FeasibleSet + ?Sized,
{
    let moved = set.project(&(x - gradient));
    (&moved - x).fold(0.0, |m, v| m.max(v.abs()))
}

fn is_finite(value: f64, gradient: &Array1<f64>) -> bool {
    value.is_finite() && gradient.iter().all(|g| g.is_finite())
}

fn projected_gradient<F, S>(
    f: &F,
    set: &S,
    start: Array1<f64>,
    config: &OptimizerConfig,
) -> Result<(Array1<f64>, f64, usize), SolverError>
where
    F: Fn(&Array1<f64>) -> (f64, Array1<f64>),
    S: FeasibleSet + ?Sized,
{
    let mut x = start;
    let (mut fx, mut gx) = f(&x);
    if !is_finite(fx, &gx) {
        return Err(SolverError::NonFinite { iteration: 0 });
    }
    let mut pg_norm = projected_step_norm(set, &x, &gx);

    let mut step = 1.0;
    for iteration in 0..config.max_iterations {
        let scale = gx.fold(1.0_f64, |m, g| m.max(g.abs()));
        if pg_norm <= config.tolerance * scale {
            return Ok((x, fx, iteration));
        }

        let mut alpha = step;
        let accepted = loop {
            let mut trial = x.clone();
            trial.scaled_add(-alpha, &gx);
            let candidate = set.project(&trial);
            let direction = &candidate - &x;
            let (fc, gc) = f(&candidate);
            if is_finite(fc, &gc) && fc <= fx + ARMIJO * gx.dot(&direction) {
                break Some((candidate, direction, fc, gc));
            }
            alpha *= 0.5;
            if alpha < MIN_STEP {
                break None;
            }
        };

        let Some((candidate, direction, fc, gc)) = accepted else {
            if pg_norm <= config.stall_tolerance {
                tracing::debug!(iteration, pg_norm, "line search stalled near optimum");
                return Ok((x, fx, iteration));
            }
            return Err(SolverError::LineSearchFailed {
                iteration,
                stationarity: pg_norm,
            });
        };

        // Barzilai-Borwein step length for the next trial
        let y = &gc - &gx;
        let sy = direction.dot(&y);
        let ss = direction.dot(&direction);
        step = if sy > 0.0 {
            (ss / sy).clamp(MIN_STEP, MAX_STEP)
        } else {
            (alpha * 2.0).min(MAX_STEP)
        };

        let flat = fx - fc <= FLAT_DECREASE * fx.abs().max(1.0);
        x = candidate;
        fx = fc;
        gx = gc;
        pg_norm = projected_step_norm(set, &x, &gx);

        if flat && pg_norm <= config.stall_tolerance {
            tracing::debug!(iteration, pg_norm, "objective flat near optimum");
            return Ok((x, fx, iteration + 1));
        }
    }

    if pg_norm <= config.stall_tolerance {
        tracing::debug!(pg_norm, "iteration cap reached near optimum");
        return Ok((x, fx, config.max_iterations));
    }
    Err(SolverError::MaxIterations {
        iterations: config.max_iterations,
        stationarity: pg_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplex::{LinearEquality, Simplex, SimplexSlice};
    use approx::assert_relative_eq;
    use ndarray::array;

    /// ‖w − c‖² with c possibly outside the simplex
    fn distance_to(c: Array1<f64>) -> impl Fn(&Array1<f64>) -> (f64, Array1<f64>) {
        move |w: &Array1<f64>| {
            let d = w - &c;
            (d.dot(&d), d * 2.0)
        }
    }

    /// offset + ½ Σ h_i (w_i − c_i)²
    fn offset_quadratic(
        offset: f64,
        h: Array1<f64>,
        c: Array1<f64>,
    ) -> impl Fn(&Array1<f64>) -> (f64, Array1<f64>) {
        move |w: &Array1<f64>| {
            let d = w - &c;
            let hd = &h * &d;
            (offset + 0.5 * d.dot(&hd), hd)
        }
    }

    #[test]
    fn test_interior_minimum() {
        let solution = minimize_on_simplex(
            distance_to(array![0.1, 0.3, 0.6]),
            &array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            &Simplex,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert_relative_eq!(solution.x[0], 0.1, epsilon = 1e-9);
        assert_relative_eq!(solution.x[1], 0.3, epsilon = 1e-9);
        assert_relative_eq!(solution.x[2], 0.6, epsilon = 1e-9);
        assert_relative_eq!(solution.objective, 0.0, epsilon = 1e-16);
    }

    #[test]
    fn test_minimum_on_boundary() {
        // Unconstrained minimum (1, 1, -1) projects to (0.5, 0.5, 0)
        let solution = minimize_on_simplex(
            distance_to(array![1.0, 1.0, -1.0]),
            &array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            &Simplex,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(solution.x[1], 0.5, epsilon = 1e-9);
        assert_relative_eq!(solution.x[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_equality() {
        // Closest point to the centre of the simplex with x0 + 2 x1 + 3 x2 = 2.5
        let constraint = LinearEquality::new(array![1.0, 2.0, 3.0], 2.5);
        let slice = SimplexSlice::new(constraint.clone()).unwrap();
        let solution = minimize_on_simplex(
            distance_to(array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]),
            &array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            &slice,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert!(solution.constraint_violation <= 1e-12);
        assert_relative_eq!(constraint.residual(&solution.x), 0.0, epsilon = 1e-12);
        assert_relative_eq!(solution.x.sum(), 1.0, epsilon = 1e-12);
        // By symmetry the step away from the centre is along (-1, 0, 1)
        assert_relative_eq!(solution.x[0], 1.0 / 12.0, epsilon = 1e-9);
        assert_relative_eq!(solution.x[1], 1.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(solution.x[2], 7.0 / 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_equality_with_two_coordinates_needs_no_iterations() {
        let slice = SimplexSlice::new(LinearEquality::new(array![0.1, 0.3], 0.2)).unwrap();
        let solution = minimize_on_simplex(
            distance_to(array![1.0, 0.0]),
            &array![0.5, 0.5],
            &slice,
            &OptimizerConfig::default(),
        )
        .unwrap();
        assert_eq!(solution.iterations, 0);
        assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rounding_floor_counts_as_converged() {
        // With values near 1e3 the objective stops changing in floating
        // point long before the scaled tolerance of 1e-10 is reachable
        let c = array![0.3, 0.3, 0.4];
        let solution = minimize_on_simplex(
            offset_quadratic(1e3, array![0.1, 1.0, 10.0], c.clone()),
            &array![0.6, 0.2, 0.2],
            &Simplex,
            &OptimizerConfig::default(),
        )
        .unwrap();
        for (x, c) in solution.x.iter().zip(c.iter()) {
            assert_relative_eq!(*x, *c, epsilon = 1e-4);
        }
        assert_relative_eq!(solution.x.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_start() {
        let err = minimize_on_simplex(
            |w: &Array1<f64>| (f64::NAN, w.clone()),
            &array![0.5, 0.5],
            &Simplex,
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, SolverError::NonFinite { iteration: 0 });
    }

    #[test]
    fn test_iteration_cap() {
        let config = OptimizerConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let err = minimize_on_simplex(
            distance_to(array![0.9, 0.05, 0.05]),
            &array![0.2, 0.3, 0.5],
            &Simplex,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::MaxIterations { iterations: 1, .. }));
    }

    #[test]
    fn test_constraint_dimension_checked() {
        let slice = SimplexSlice::new(LinearEquality::new(array![1.0, 2.0, 3.0], 2.0)).unwrap();
        let err = minimize_on_simplex(
            distance_to(array![0.5, 0.5]),
            &array![0.5, 0.5],
            &slice,
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { expected: 3, actual: 2 }));
    }
}
