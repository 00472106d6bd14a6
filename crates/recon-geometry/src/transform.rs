//! Section transforms.
//!
//! A [`Transform`] is a coefficient set (`dim`, `xcoef`, `ycoef`) plus the
//! [`Mapping`] derived from it. Families by `dim`:
//!
//! | dim | family                 | coefficients per axis |
//! |-----|------------------------|-----------------------|
//! | 0   | identity               | 0                     |
//! | 1   | translation            | 1                     |
//! | 2   | scale / skew (swapped) | 3                     |
//! | 3   | full affine            | 3                     |
//! | 4-6 | polynomial             | `dim`                 |
//!
//! Polynomial coefficients follow `x' = a0 + a1 x + a2 y + a3 xy + a4 x^2 + a5 y^2`.
//! The mapping is rebuilt whenever the coefficients are replaced and is
//! `None` when the coefficient set is incomplete.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GeometryError, GeometryResult};
use crate::point::Point2;
use crate::solver::{self, InverseSolution, SolverConfig};

/// Highest supported `dim`.
pub const MAX_DIM: u8 = 6;

/// Raw coefficient set as read from a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xcoef: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ycoef: Option<Vec<f64>>,
}

impl TransformSpec {
    pub fn new(dim: u8, xcoef: Vec<f64>, ycoef: Vec<f64>) -> Self {
        Self {
            dim: Some(dim),
            xcoef: Some(xcoef),
            ycoef: Some(ycoef),
        }
    }
}

/// Row-major 2x3 affine matrix: `x' = m[0][0] x + m[0][1] y + m[0][2]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMatrix {
    pub m: [[f64; 3]; 2],
}

impl AffineMatrix {
    pub const IDENTITY: AffineMatrix = AffineMatrix {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    };

    pub fn apply(&self, p: Point2) -> Point2 {
        let [r0, r1] = self.m;
        Point2::new(
            r0[0] * p.x + r0[1] * p.y + r0[2],
            r1[0] * p.x + r1[1] * p.y + r1[2],
        )
    }

    pub fn determinant(&self) -> f64 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    /// Closed-form inverse, `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<AffineMatrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [[a, b, c], [d, e, f]] = self.m;
        let ia = e / det;
        let ib = -b / det;
        let id = -d / det;
        let ie = a / det;
        Some(AffineMatrix {
            m: [
                [ia, ib, -(ia * c + ib * f)],
                [id, ie, -(id * c + ie * f)],
            ],
        })
    }
}

/// Second-order polynomial mapping with six coefficients per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polynomial {
    pub a: [f64; 6],
    pub b: [f64; 6],
}

impl Polynomial {
    pub fn forward(&self, p: Point2) -> Point2 {
        Point2::new(eval(&self.a, p), eval(&self.b, p))
    }

    /// `[[du/dx, du/dy], [dv/dx, dv/dy]]` at `p`.
    pub fn jacobian(&self, p: Point2) -> [[f64; 2]; 2] {
        let (a, b) = (&self.a, &self.b);
        [
            [
                a[1] + a[3] * p.y + 2.0 * a[4] * p.x,
                a[2] + a[3] * p.x + 2.0 * a[5] * p.y,
            ],
            [
                b[1] + b[3] * p.y + 2.0 * b[4] * p.x,
                b[2] + b[3] * p.x + 2.0 * b[5] * p.y,
            ],
        ]
    }
}

fn eval(c: &[f64; 6], p: Point2) -> f64 {
    c[0] + c[1] * p.x + c[2] * p.y + c[3] * p.x * p.y + c[4] * p.x * p.x + c[5] * p.y * p.y
}

/// A mapping derived from a complete coefficient set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mapping {
    Affine {
        forward: AffineMatrix,
        inverse: Option<AffineMatrix>,
    },
    Polynomial(Polynomial),
}

impl Mapping {
    /// Build the mapping for `spec`, or `None` if it is incomplete.
    pub fn build(spec: &TransformSpec) -> Option<Mapping> {
        let dim = spec.dim?;
        if dim > MAX_DIM {
            return None;
        }
        let needed = required_coefficients(dim);
        let a = padded(spec.xcoef.as_deref(), needed)?;
        let b = padded(spec.ycoef.as_deref(), needed)?;

        let affine = |m: [[f64; 3]; 2]| {
            let forward = AffineMatrix { m };
            Mapping::Affine {
                forward,
                inverse: forward.inverse(),
            }
        };

        Some(match dim {
            0 => affine(AffineMatrix::IDENTITY.m),
            1 => affine([[1.0, 0.0, a[0]], [0.0, 1.0, b[0]]]),
            // Legacy layout: the y row takes b2 before b1.
            2 => affine([[a[1], a[2], a[0]], [b[2], b[1], b[0]]]),
            3 => affine([[a[1], a[2], a[0]], [b[1], b[2], b[0]]]),
            _ => Mapping::Polynomial(Polynomial { a, b }),
        })
    }

    pub fn forward(&self, p: Point2) -> Point2 {
        match self {
            Mapping::Affine { forward, .. } => forward.apply(p),
            Mapping::Polynomial(poly) => poly.forward(p),
        }
    }

    pub fn solve_inverse(&self, p: Point2, config: &SolverConfig) -> GeometryResult<InverseSolution> {
        match self {
            Mapping::Affine { inverse: Some(inv), .. } => Ok(InverseSolution::exact(inv.apply(p))),
            Mapping::Affine { forward, inverse: None } => Err(GeometryError::SingularTransform {
                determinant: forward.determinant(),
            }),
            Mapping::Polynomial(poly) => Ok(solver::solve(poly, p, config)),
        }
    }

    pub fn is_polynomial(&self) -> bool {
        matches!(self, Mapping::Polynomial(_))
    }
}

fn required_coefficients(dim: u8) -> usize {
    match dim {
        0 => 0,
        1 => 1,
        2 | 3 => 3,
        d => usize::from(d),
    }
}

/// First `needed` coefficients, zero-padded to six. `None` if too few are given.
fn padded(coef: Option<&[f64]>, needed: usize) -> Option<[f64; 6]> {
    let mut out = [0.0; 6];
    if needed == 0 {
        return Some(out);
    }
    let coef = coef?;
    if coef.len() < needed {
        return None;
    }
    out[..needed].copy_from_slice(&coef[..needed]);
    Some(out)
}

/// A coordinate transform between section-local and world coordinates.
///
/// `inverse` maps local points into the world frame; `forward` maps world
/// points back. Contours share transforms through `Arc<Transform>`, so a
/// transform is only changed through [`Transform::set_coefficients`], which
/// rebuilds the mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "TransformSpec", into = "TransformSpec")]
pub struct Transform {
    spec: TransformSpec,
    mapping: Option<Mapping>,
    solver: SolverConfig,
}

impl Transform {
    pub fn new(spec: TransformSpec) -> Self {
        let mapping = Mapping::build(&spec);
        if mapping.is_none() {
            tracing::debug!(dim = ?spec.dim, "transform has no usable mapping");
        }
        Self {
            spec,
            mapping,
            solver: SolverConfig::default(),
        }
    }

    pub fn from_coefficients(dim: u8, xcoef: Vec<f64>, ycoef: Vec<f64>) -> Self {
        Self::new(TransformSpec::new(dim, xcoef, ycoef))
    }

    pub fn identity() -> Self {
        Self::from_coefficients(0, vec![0.0; 6], vec![0.0; 6])
    }

    /// Replace the solver tuning used by [`Transform::inverse`].
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Replace the coefficients and rebuild the mapping.
    pub fn set_coefficients(&mut self, spec: TransformSpec) {
        *self = Self::new(spec).with_solver(self.solver);
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    pub fn dim(&self) -> Option<u8> {
        self.spec.dim
    }

    pub fn xcoef(&self) -> Option<&[f64]> {
        self.spec.xcoef.as_deref()
    }

    pub fn ycoef(&self) -> Option<&[f64]> {
        self.spec.ycoef.as_deref()
    }

    /// The cached mapping, `None` while the coefficient set is incomplete.
    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    pub fn is_usable(&self) -> bool {
        self.mapping.is_some()
    }

    /// `true` iff coefficients 3..=5 of both axes are zero (absent counts as zero).
    pub fn is_affine(&self) -> bool {
        let quadratic_free = |coef: Option<&[f64]>| {
            coef.map_or(true, |c| c.iter().skip(3).take(3).all(|v| *v == 0.0))
        };
        quadratic_free(self.xcoef()) && quadratic_free(self.ycoef())
    }

    fn require_mapping(&self) -> GeometryResult<&Mapping> {
        self.mapping
            .as_ref()
            .ok_or(GeometryError::MappingUnavailable { dim: self.spec.dim })
    }

    pub fn forward(&self, p: Point2) -> GeometryResult<Point2> {
        Ok(self.require_mapping()?.forward(p))
    }

    /// Invert one point, reporting iterations and convergence.
    pub fn solve_inverse(&self, p: Point2) -> GeometryResult<InverseSolution> {
        self.require_mapping()?.solve_inverse(p, &self.solver)
    }

    /// Invert one point. A non-convergent polynomial solve logs a warning
    /// and still yields its best estimate.
    pub fn inverse(&self, p: Point2) -> GeometryResult<Point2> {
        let solution = self.solve_inverse(p)?;
        if !solution.converged {
            warn!(
                target_x = p.x,
                target_y = p.y,
                iterations = solution.iterations,
                residual = solution.residual,
                "polynomial inverse did not converge; using best estimate"
            );
        }
        Ok(solution.point)
    }

    pub fn forward_points(&self, points: &[Point2]) -> GeometryResult<Vec<Point2>> {
        let mapping = self.require_mapping()?;
        Ok(points.iter().map(|p| mapping.forward(*p)).collect())
    }

    pub fn inverse_points(&self, points: &[Point2]) -> GeometryResult<Vec<Point2>> {
        points.iter().map(|p| self.inverse(*p)).collect()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl From<TransformSpec> for Transform {
    fn from(spec: TransformSpec) -> Self {
        Self::new(spec)
    }
}

impl From<Transform> for TransformSpec {
    fn from(t: Transform) -> Self {
        t.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Point2, b: Point2, tol: f64) -> bool {
        a.manhattan(b) <= tol
    }

    fn six(v: &[f64]) -> Vec<f64> {
        let mut out = v.to_vec();
        out.resize(6, 0.0);
        out
    }

    #[test]
    fn identity_maps_points_to_themselves() {
        let t = Transform::identity();
        let p = Point2::new(3.5, -1.25);
        assert_eq!(t.forward(p).unwrap(), p);
        assert_eq!(t.inverse(p).unwrap(), p);
        assert!(t.is_affine());
    }

    #[test]
    fn dim0_needs_no_coefficients() {
        let t = Transform::new(TransformSpec {
            dim: Some(0),
            xcoef: None,
            ycoef: None,
        });
        assert!(t.is_usable());
    }

    #[test]
    fn dim1_translates() {
        let t = Transform::from_coefficients(1, six(&[2.0]), six(&[-3.0]));
        assert_eq!(t.forward(Point2::new(1.0, 1.0)).unwrap(), Point2::new(3.0, -2.0));
        assert_eq!(t.inverse(Point2::new(3.0, -2.0)).unwrap(), Point2::new(1.0, 1.0));
    }

    #[test]
    fn dim2_swaps_second_and_third_y_coefficients() {
        let t = Transform::from_coefficients(2, six(&[0.0, 2.0, 0.0]), six(&[0.0, 3.0, 5.0]));
        // x' = 2x, y' = 5x + 3y
        assert_eq!(t.forward(Point2::new(1.0, 1.0)).unwrap(), Point2::new(2.0, 8.0));
        assert_eq!(t.forward(Point2::new(0.0, 1.0)).unwrap(), Point2::new(0.0, 3.0));
    }

    #[test]
    fn dim3_uses_natural_layout() {
        let t = Transform::from_coefficients(3, six(&[1.0, 2.0, 0.5]), six(&[-1.0, 0.25, 3.0]));
        // x' = 1 + 2x + 0.5y, y' = -1 + 0.25x + 3y
        assert_eq!(t.forward(Point2::new(2.0, 4.0)).unwrap(), Point2::new(7.0, 11.5));
    }

    #[test]
    fn polynomial_forward_uses_only_dim_terms() {
        let x = vec![0.0, 1.0, 0.0, 0.5, 7.0, 7.0];
        let y = vec![0.0, 0.0, 1.0, 0.0, 7.0, 7.0];
        let t = Transform::from_coefficients(4, x, y);
        // dim 4 ignores a4, a5: x' = x + 0.5xy
        assert_eq!(t.forward(Point2::new(2.0, 2.0)).unwrap(), Point2::new(4.0, 2.0));
    }

    #[test]
    fn dim5_adds_squared_x_term() {
        let x = vec![0.0, 1.0, 0.0, 0.5, 7.0, 3.0];
        let y = vec![0.0, 0.0, 1.0, 0.0, 5.0, 11.0];
        let t = Transform::from_coefficients(5, x, y);
        // x' = x + 0.5xy + 7x², y' = y + 5x²
        assert_eq!(t.forward(Point2::new(2.0, 2.0)).unwrap(), Point2::new(32.0, 22.0));
    }

    #[test]
    fn dim6_adds_squared_y_term() {
        let x = vec![0.0, 1.0, 0.0, 0.5, 7.0, 3.0];
        let y = vec![0.0, 0.0, 1.0, 0.0, 5.0, 11.0];
        let t = Transform::from_coefficients(6, x, y);
        // x' = x + 0.5xy + 7x² + 3y², y' = y + 5x² + 11y²
        assert_eq!(t.forward(Point2::new(2.0, 2.0)).unwrap(), Point2::new(44.0, 66.0));
    }

    #[test]
    fn dim5_needs_five_coefficients() {
        let t = Transform::from_coefficients(5, vec![0.0, 1.0, 0.0, 0.0], six(&[0.0, 0.0, 1.0]));
        assert!(t.mapping().is_none());
    }

    #[test]
    fn polynomial_shift_inverse_converges() {
        let t = Transform::from_coefficients(
            4,
            six(&[0.1, 1.0, 0.0, 0.0]),
            six(&[0.1, 0.0, 1.0, 0.0]),
        );
        assert!(t.is_affine());
        let sol = t.solve_inverse(Point2::new(5.0, 7.0)).unwrap();
        assert!(sol.converged);
        assert!(sol.iterations <= 100);
        assert!(sol.residual < 5e-10);
        assert!(approx(sol.point, Point2::new(4.9, 6.9), 5e-10));
    }

    #[test]
    fn missing_dim_or_coefficients_leave_mapping_unavailable() {
        let no_dim = Transform::new(TransformSpec {
            dim: None,
            xcoef: Some(six(&[1.0])),
            ycoef: Some(six(&[1.0])),
        });
        assert!(no_dim.mapping().is_none());

        let short = Transform::from_coefficients(3, vec![1.0, 1.0], six(&[0.0, 0.0, 1.0]));
        assert!(!short.is_usable());
        assert_eq!(
            short.forward(Point2::origin()),
            Err(GeometryError::MappingUnavailable { dim: Some(3) })
        );

        let too_high = Transform::from_coefficients(7, six(&[]), six(&[]));
        assert!(!too_high.is_usable());
    }

    #[test]
    fn singular_affine_has_no_inverse() {
        let t = Transform::from_coefficients(3, six(&[0.0, 1.0, 1.0]), six(&[0.0, 2.0, 2.0]));
        assert!(t.is_usable());
        assert!(matches!(
            t.inverse(Point2::origin()),
            Err(GeometryError::SingularTransform { .. })
        ));
    }

    #[test]
    fn set_coefficients_rebuilds_mapping() {
        let mut t = Transform::identity();
        let p = Point2::new(1.0, 1.0);
        assert_eq!(t.forward(p).unwrap(), p);
        t.set_coefficients(TransformSpec::new(1, six(&[1.0]), six(&[1.0])));
        assert_eq!(t.forward(p).unwrap(), Point2::new(2.0, 2.0));
    }

    #[test]
    fn is_affine_checks_high_order_coefficients_regardless_of_dim() {
        let quad = Transform::from_coefficients(1, six(&[0.0, 1.0, 0.0, 0.0, 0.3]), six(&[]));
        assert!(!quad.is_affine());
        let y_quad = Transform::from_coefficients(6, six(&[0.0, 1.0]), six(&[0.0, 0.0, 1.0, 0.0, 0.0, 1e-9]));
        assert!(!y_quad.is_affine());
        let flat = Transform::from_coefficients(6, six(&[0.0, 1.0]), six(&[0.0, 0.0, 1.0]));
        assert!(flat.is_affine());
    }

    #[test]
    fn serde_roundtrip_preserves_coefficients() {
        let t = Transform::from_coefficients(3, six(&[1.0, 2.0, 0.5]), six(&[-1.0, 0.25, 3.0]));
        let json = serde_json::to_string(&t).unwrap();
        let parsed: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
        assert!(parsed.is_usable());
    }

    fn affine_coefficients() -> impl Strategy<Value = (u8, Vec<f64>, Vec<f64>)> {
        (
            1u8..=3,
            prop::collection::vec(-5.0f64..5.0, 3),
            prop::collection::vec(-5.0f64..5.0, 3),
        )
            .prop_map(|(dim, mut x, mut y)| {
                // Keep the linear part comfortably invertible for both layouts.
                x[1] += 10.0;
                x[2] *= 0.1;
                y[1] += 10.0;
                y[2] += 10.0;
                x.resize(6, 0.0);
                y.resize(6, 0.0);
                (dim, x, y)
            })
    }

    fn mild_polynomial() -> impl Strategy<Value = (u8, Vec<f64>, Vec<f64>)> {
        (
            4u8..=6,
            prop::collection::vec(-1e-3f64..1e-3, 3),
            prop::collection::vec(-1e-3f64..1e-3, 3),
            (-1.0f64..1.0, -1.0f64..1.0),
        )
            .prop_map(|(dim, xq, yq, (dx, dy))| {
                let x = vec![dx, 1.0, 0.0, xq[0], xq[1], xq[2]];
                let y = vec![dy, 0.0, 1.0, yq[0], yq[1], yq[2]];
                (dim, x, y)
            })
    }

    proptest! {
        #[test]
        fn affine_roundtrip_is_exact((dim, x, y) in affine_coefficients(),
                                     px in -100.0f64..100.0, py in -100.0f64..100.0) {
            let t = Transform::from_coefficients(dim, x, y);
            let p = Point2::new(px, py);
            let there = t.forward(t.inverse(p).unwrap()).unwrap();
            let back = t.inverse(t.forward(p).unwrap()).unwrap();
            prop_assert!(approx(there, p, 1e-9));
            prop_assert!(approx(back, p, 1e-9));
        }

        #[test]
        fn polynomial_roundtrip_within_tolerance((dim, x, y) in mild_polynomial(),
                                                 px in -50.0f64..50.0, py in -50.0f64..50.0) {
            let t = Transform::from_coefficients(dim, x, y);
            let p = Point2::new(px, py);
            let sol = t.solve_inverse(p).unwrap();
            prop_assert!(sol.converged);
            prop_assert!(approx(t.forward(sol.point).unwrap(), p, 5e-10));
            let back = t.inverse(t.forward(p).unwrap()).unwrap();
            prop_assert!(approx(back, p, 1e-6));
        }

        #[test]
        fn is_affine_iff_high_order_terms_vanish(dim in 0u8..=6,
                                                 x in prop::collection::vec(prop_oneof![Just(0.0), -1.0f64..1.0], 6),
                                                 y in prop::collection::vec(prop_oneof![Just(0.0), -1.0f64..1.0], 6)) {
            let expected = x[3..].iter().chain(&y[3..]).all(|v| *v == 0.0);
            let t = Transform::from_coefficients(dim, x, y);
            prop_assert_eq!(t.is_affine(), expected);
        }
    }
}
