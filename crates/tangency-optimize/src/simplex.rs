//! Euclidean projections onto the long-only feasible sets
//!
//! Δ = { w : w_i ≥ 0, Σ w_i = 1 }
//!
//! The long-only, fully invested feasible set is exactly Δ (the upper bound
//! w_i ≤ 1 is implied), so one projection enforces both the budget and the
//! box constraints. Uses the sort-based method of Duchi et al. (2008).
//!
//! A linear equality aᵀw = b cuts Δ down to a slice. Projecting onto the
//! slice is a one-dimensional search over the multiplier ν of the equality:
//!
//! w(ν) = P_Δ(v − ν a)
//!
//! where aᵀw(ν) is non-increasing in ν. The search brackets the root,
//! bisects until both ends share an active set and then interpolates, which
//! is exact because w(ν) is affine on each active set.

use crate::solver::SolverError;
use ndarray::Array1;

/// Bisection steps when locating the slice multiplier
const BISECTION_STEPS: usize = 200;

/// Bracket doublings before falling back to the extreme face
const MAX_DOUBLINGS: usize = 64;

/// A closed convex subset of Δ with a Euclidean projection
pub trait FeasibleSet {
    /// Closest point of the set to `v`.
    fn project(&self, v: &Array1<f64>) -> Array1<f64>;

    /// Largest equality residual at `w`; zero for sets without equalities.
    fn violation(&self, _w: &Array1<f64>) -> f64 {
        0.0
    }

    /// Required dimension, when the set fixes one
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// The probability simplex Δ itself
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex;

impl FeasibleSet for Simplex {
    fn project(&self, v: &Array1<f64>) -> Array1<f64> {
        project_onto_simplex(v)
    }
}

/// Linear equality constraint aᵀw = b
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquality {
    /// Coefficients a
    pub coefficients: Array1<f64>,
    /// Right-hand side b
    pub target: f64,
}

impl LinearEquality {
    /// Create aᵀw = b
    pub const fn new(coefficients: Array1<f64>, target: f64) -> Self {
        Self {
            coefficients,
            target,
        }
    }

    /// aᵀw − b
    pub fn residual(&self, w: &Array1<f64>) -> f64 {
        self.coefficients.dot(w) - self.target
    }
}

/// Δ ∩ { w : aᵀw = b }
#[derive(Debug, Clone)]
pub struct SimplexSlice {
    constraint: LinearEquality,
    lowest: f64,
    highest: f64,
}

impl SimplexSlice {
    /// Slice Δ with `constraint`.
    ///
    /// # Errors
    /// [`SolverError::Infeasible`] when b lies outside [min a, max a], the
    /// range aᵀw covers on Δ, or any value is not finite.
    pub fn new(constraint: LinearEquality) -> Result<Self, SolverError> {
        let a = &constraint.coefficients;
        if a.is_empty() {
            return Err(SolverError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let lowest = a.fold(f64::INFINITY, |m, &x| m.min(x));
        let highest = a.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
        let target = constraint.target;
        let finite = a.iter().all(|x| x.is_finite()) && target.is_finite();
        if !finite || target < lowest || target > highest {
            return Err(SolverError::Infeasible {
                target,
                lowest,
                highest,
            });
        }
        Ok(Self {
            constraint,
            lowest,
            highest,
        })
    }

    /// The cutting equality
    pub const fn constraint(&self) -> &LinearEquality {
        &self.constraint
    }

    fn point(&self, v: &Array1<f64>, nu: f64) -> Bracket {
        let a = &self.constraint.coefficients;
        let w = project_onto_simplex(&(v - &(a * nu)));
        let value = a.dot(&w);
        Bracket { nu, w, value }
    }
}

impl FeasibleSet for SimplexSlice {
    fn project(&self, v: &Array1<f64>) -> Array1<f64> {
        let a = &self.constraint.coefficients;
        let b = self.constraint.target;

        if self.highest == self.lowest {
            // aᵀw = b holds on all of Δ
            return project_onto_simplex(v);
        }
        if b == self.lowest || b == self.highest {
            return project_onto_face(v, a, b);
        }

        let origin = self.point(v, 0.0);
        if origin.value == b {
            return origin.w;
        }

        // Larger ν lowers aᵀw
        let direction = if origin.value > b { 1.0 } else { -1.0 };
        let spread = self.highest - self.lowest;
        let mut step = (v.fold(0.0_f64, |m, x| m.max(x.abs())) + 1.0) / spread;

        let mut near = origin;
        let mut far = None;
        for _ in 0..MAX_DOUBLINGS {
            let candidate = self.point(v, direction * step);
            if (candidate.value - b) * direction <= 0.0 {
                far = Some(candidate);
                break;
            }
            near = candidate;
            step *= 2.0;
        }

        let Some(mut far) = far else {
            // Only near-ties in a keep the bracket open this long
            let extreme = if direction > 0.0 {
                self.lowest
            } else {
                self.highest
            };
            let face = Bracket {
                nu: f64::NAN,
                w: project_onto_face(v, a, extreme),
                value: extreme,
            };
            return interpolate(&near, &face, b);
        };

        for _ in 0..BISECTION_STEPS {
            let affine = same_support(&near.w, &far.w);
            let mid = if affine {
                // Secant step; exact when no coordinate switches on in between
                let theta = (b - far.value) / (near.value - far.value);
                far.nu + theta.clamp(0.0, 1.0) * (near.nu - far.nu)
            } else {
                0.5 * (near.nu + far.nu)
            };
            if !mid.is_finite() || mid == near.nu || mid == far.nu {
                break;
            }
            let candidate = self.point(v, mid);
            if candidate.value == b {
                return candidate.w;
            }
            if affine && same_support(&candidate.w, &near.w) {
                break;
            }
            if (candidate.value - b) * direction > 0.0 {
                near = candidate;
            } else {
                far = candidate;
            }
        }

        interpolate(&near, &far, b)
    }

    fn violation(&self, w: &Array1<f64>) -> f64 {
        self.constraint.residual(w).abs()
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.constraint.coefficients.len())
    }
}

/// One end of the multiplier bracket
struct Bracket {
    nu: f64,
    w: Array1<f64>,
    value: f64,
}

/// Point on the segment between `p` and `q` where aᵀw = b
fn interpolate(p: &Bracket, q: &Bracket, b: f64) -> Array1<f64> {
    let gap = p.value - q.value;
    let theta = if gap == 0.0 {
        0.5
    } else {
        ((b - q.value) / gap).clamp(0.0, 1.0)
    };
    &p.w * theta + &q.w * (1.0 - theta)
}

fn same_support(p: &Array1<f64>, q: &Array1<f64>) -> bool {
    p.iter().zip(q.iter()).all(|(x, y)| (*x > 0.0) == (*y > 0.0))
}

/// Project onto the face of Δ spanned by coordinates with a_i == value
fn project_onto_face(v: &Array1<f64>, a: &Array1<f64>, value: f64) -> Array1<f64> {
    let indices: Vec<usize> = (0..a.len()).filter(|&i| a[i] == value).collect();
    let sub: Array1<f64> = indices.iter().map(|&i| v[i]).collect();
    let projected = project_onto_simplex(&sub);

    let mut w = Array1::zeros(v.len());
    for (&i, &x) in indices.iter().zip(projected.iter()) {
        w[i] = x;
    }
    w
}

/// Closest point of the simplex to `v` in the Euclidean norm.
///
/// Non-finite inputs propagate into the output; callers check finiteness.
pub fn project_onto_simplex(v: &Array1<f64>) -> Array1<f64> {
    let mut sorted: Vec<f64> = v.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (j + 1) as f64;
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }

    v.mapv(|x| (x - theta).max(0.0))
}
