//! Error types for the geometry crate.

use thiserror::Error;

use crate::shape::ShapeKind;

/// Errors produced by transform and shape operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The transform lacks the `dim` or coefficients its family needs.
    #[error("mapping unavailable for transform (dim {dim:?})")]
    MappingUnavailable { dim: Option<u8> },

    /// The affine matrix has a zero determinant and cannot be inverted.
    #[error("affine transform is singular (determinant {determinant})")]
    SingularTransform { determinant: f64 },

    /// Too few points to build a shape of the requested kind.
    #[error("degenerate {kind}: {points} point(s), need at least {required}")]
    DegenerateGeometry {
        kind: ShapeKind,
        points: usize,
        required: usize,
    },

    /// Winding and area are only defined for closed shapes.
    #[error("open shape has no {0}")]
    OpenShape(&'static str),
}

/// Convenience alias for geometry results.
pub type GeometryResult<T> = Result<T, GeometryError>;
