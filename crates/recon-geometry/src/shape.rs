//! World-space shapes derived from tracings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{GeometryError, GeometryResult};
use crate::point::Point2;

/// Which kind of shape a tracing produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Polyline,
}

impl ShapeKind {
    /// Minimum vertex count for a non-degenerate shape.
    pub const fn min_points(self) -> usize {
        match self {
            ShapeKind::Polygon => 3,
            ShapeKind::Polyline => 2,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Polygon => write!(f, "polygon"),
            ShapeKind::Polyline => write!(f, "polyline"),
        }
    }
}

fn check_len(kind: ShapeKind, points: &[Point2]) -> GeometryResult<()> {
    let required = kind.min_points();
    if points.len() < required {
        return Err(GeometryError::DegenerateGeometry {
            kind,
            points: points.len(),
            required,
        });
    }
    Ok(())
}

fn path_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// A closed ring; the closing edge from the last vertex to the first is implicit.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point2>,
    bbox: BoundingBox,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2>) -> GeometryResult<Self> {
        check_len(ShapeKind::Polygon, &vertices)?;
        let bbox = BoundingBox::from_points(&vertices).ok_or(GeometryError::DegenerateGeometry {
            kind: ShapeKind::Polygon,
            points: 0,
            required: 3,
        })?;
        Ok(Self { vertices, bbox })
    }

    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Edges as `(start, end)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area: positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        0.5 * self.edges().map(|(a, b)| a.cross(b)).sum::<f64>()
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Perimeter including the closing edge.
    pub fn length(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }
}

/// An open path through at least two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    vertices: Vec<Point2>,
    bbox: BoundingBox,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2>) -> GeometryResult<Self> {
        check_len(ShapeKind::Polyline, &vertices)?;
        let bbox = BoundingBox::from_points(&vertices).ok_or(GeometryError::DegenerateGeometry {
            kind: ShapeKind::Polyline,
            points: 0,
            required: 2,
        })?;
        Ok(Self { vertices, bbox })
    }

    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn length(&self) -> f64 {
        path_length(&self.vertices)
    }
}

/// A tracing in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polygon(Polygon),
    Polyline(Polyline),
}

impl Shape {
    /// Build a polygon (`closed`) or polyline from world-space vertices.
    pub fn from_world_points(points: Vec<Point2>, closed: bool) -> GeometryResult<Shape> {
        if closed {
            Polygon::new(points).map(Shape::Polygon)
        } else {
            Polyline::new(points).map(Shape::Polyline)
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Polyline(_) => ShapeKind::Polyline,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Shape::Polygon(_))
    }

    pub fn vertices(&self) -> &[Point2] {
        match self {
            Shape::Polygon(p) => p.vertices(),
            Shape::Polyline(p) => p.vertices(),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Shape::Polygon(p) => p.bbox(),
            Shape::Polyline(p) => p.bbox(),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Shape::Polygon(p) => p.length(),
            Shape::Polyline(p) => p.length(),
        }
    }

    pub fn area(&self) -> GeometryResult<f64> {
        match self {
            Shape::Polygon(p) => Ok(p.area()),
            Shape::Polyline(_) => Err(GeometryError::OpenShape("area")),
        }
    }

    pub fn is_clockwise(&self) -> GeometryResult<bool> {
        match self {
            Shape::Polygon(p) => Ok(p.is_clockwise()),
            Shape::Polyline(_) => Err(GeometryError::OpenShape("winding")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2> {
        raw.iter().map(|&p| Point2::from(p)).collect()
    }

    #[test]
    fn counter_clockwise_square_has_positive_area() {
        let sq = Polygon::new(pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)])).unwrap();
        assert_eq!(sq.signed_area(), 4.0);
        assert!(!sq.is_clockwise());
        assert_eq!(sq.length(), 8.0);
    }

    #[test]
    fn clockwise_square_reports_clockwise() {
        let sq = Polygon::new(pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)])).unwrap();
        assert_eq!(sq.signed_area(), -4.0);
        assert_eq!(sq.area(), 4.0);
        assert!(sq.is_clockwise());
    }

    #[test]
    fn polyline_length_has_no_closing_segment() {
        let line = Polyline::new(pts(&[(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)])).unwrap();
        assert_eq!(line.length(), 7.0);
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let err = Shape::from_world_points(pts(&[(0.0, 0.0), (1.0, 1.0)]), true).unwrap_err();
        assert_eq!(
            err,
            GeometryError::DegenerateGeometry {
                kind: ShapeKind::Polygon,
                points: 2,
                required: 3
            }
        );
        assert!(Shape::from_world_points(pts(&[(0.0, 0.0)]), false).is_err());
        assert!(Shape::from_world_points(pts(&[(0.0, 0.0), (1.0, 1.0)]), false).is_ok());
    }

    #[test]
    fn open_shapes_have_no_area_or_winding() {
        let s = Shape::from_world_points(pts(&[(0.0, 0.0), (1.0, 0.0)]), false).unwrap();
        assert_eq!(s.area(), Err(GeometryError::OpenShape("area")));
        assert!(s.is_clockwise().is_err());
        assert_eq!(s.kind(), ShapeKind::Polyline);
    }
}
