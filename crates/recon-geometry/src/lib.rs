//! Geometry for serial-section reconstructions.
//!
//! Section tracings are stored in section-local coordinates and carry a
//! [`Transform`] that relates them to the shared world frame of the series.
//! This crate owns the transform families (affine and low-order polynomial,
//! including the iterative polynomial inverse) and the world-space
//! [`Shape`] used to decide whether two tracings describe the same object.
//!
//! # Key Types
//!
//! - [`Point2`] / [`BoundingBox`] -- planar value types
//! - [`Transform`] / [`Mapping`] -- coefficient sets and their cached mapping
//! - [`SolverConfig`] / [`InverseSolution`] -- damped Newton inverse
//! - [`Shape`] / [`Polygon`] / [`Polyline`] -- world-space tracings
//! - [`overlap_areas`] -- exact area of union and intersection

pub mod bbox;
pub mod clip;
pub mod error;
pub mod point;
pub mod shape;
pub mod solver;
pub mod transform;

pub use bbox::BoundingBox;
pub use clip::{overlap_areas, OverlapAreas};
pub use error::{GeometryError, GeometryResult};
pub use point::Point2;
pub use shape::{Polygon, Polyline, Shape, ShapeKind};
pub use solver::{InverseSolution, SolverConfig};
pub use transform::{AffineMatrix, Mapping, Polynomial, Transform, TransformSpec};

/// Ratio of union area to intersection area at or below which two closed
/// tracings are considered the same object (`1 + 2^-17`).
///
/// The same value bounds the per-vertex distance for open tracings.
pub const OVERLAP_THRESHOLD: f64 = 1.0 + 1.0 / 131_072.0;
