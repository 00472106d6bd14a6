//! Damped Newton inverse for polynomial mappings.
//!
//! Polynomial transforms have no closed-form inverse. Each target point is
//! solved independently: starting from the origin, take a Newton step when
//! the Jacobian is well conditioned and a transpose-Jacobian step when it is
//! not, until the L1 residual falls below `epsilon` or the iteration cap is
//! reached. The last estimate is returned either way.

use serde::{Deserialize, Serialize};

use crate::point::Point2;
use crate::transform::Polynomial;

/// Tuning for the polynomial inverse.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Residual tolerance, also the Jacobian determinant cutoff.
    pub epsilon: f64,
    /// Hard cap on iterations per point.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epsilon: 5e-10,
            max_iterations: 100,
        }
    }
}

/// Result of inverting a single point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InverseSolution {
    /// Best estimate of the pre-image.
    pub point: Point2,
    /// Iterations taken (0 for closed-form inverses).
    pub iterations: u32,
    /// L1 distance between `forward(point)` and the target.
    pub residual: f64,
    /// `false` when the cap was hit before the residual met tolerance.
    pub converged: bool,
}

impl InverseSolution {
    /// A closed-form solution with no residual.
    pub fn exact(point: Point2) -> Self {
        Self {
            point,
            iterations: 0,
            residual: 0.0,
            converged: true,
        }
    }
}

/// Solve `poly.forward(p) == target` for `p`.
pub fn solve(poly: &Polynomial, target: Point2, config: &SolverConfig) -> InverseSolution {
    let eps = config.epsilon;
    let mut guess = Point2::origin();
    let mut image = poly.forward(guess);
    let mut residual = target.manhattan(image);
    let mut iterations = 0;

    while residual >= eps && iterations < config.max_iterations {
        iterations += 1;
        let [[l, m], [n, o]] = poly.jacobian(guess);
        let du = target.x - image.x;
        let dv = target.y - image.y;
        let det = l * o - m * n;

        if det.abs() > eps {
            guess.x += (o * du - m * dv) / det;
            guess.y += (l * dv - n * du) / det;
        } else {
            guess.x += l * du + n * dv;
            guess.y += m * du + o * dv;
        }

        image = poly.forward(guess);
        residual = target.manhattan(image);
    }

    InverseSolution {
        point: guess,
        iterations,
        residual,
        converged: residual < eps,
    }
}
