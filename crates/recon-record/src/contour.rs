//! Named tracings and their geometric comparison.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use recon_geometry::{
    overlap_areas, BoundingBox, GeometryResult, Point2, Shape, Transform, OVERLAP_THRESHOLD,
};

/// Display and bookkeeping flags carried through merges untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourStyle {
    pub hidden: bool,
    pub simplified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A named tracing in section-local coordinates.
///
/// The world-space [`Shape`] is built on first use and cached until the
/// points change or the contour is pointed at a different transform.
#[derive(Clone, Debug)]
pub struct Contour {
    name: String,
    closed: bool,
    points: Vec<Point2>,
    transform: Arc<Transform>,
    style: ContourStyle,
    shape: OnceLock<GeometryResult<Shape>>,
}

impl Contour {
    pub fn new(
        name: impl Into<String>,
        closed: bool,
        points: Vec<Point2>,
        transform: Arc<Transform>,
    ) -> Self {
        Self {
            name: name.into(),
            closed,
            points,
            transform,
            style: ContourStyle::default(),
            shape: OnceLock::new(),
        }
    }

    pub fn with_style(mut self, style: ContourStyle) -> Self {
        self.style = style;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the contour. Geometry is unaffected.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn transform(&self) -> &Arc<Transform> {
        &self.transform
    }

    pub fn style(&self) -> &ContourStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut ContourStyle {
        &mut self.style
    }

    pub fn set_points(&mut self, points: Vec<Point2>) {
        self.points = points;
        self.shape = OnceLock::new();
    }

    /// Bind to another transform. The cached shape survives only if the
    /// handle points at the same transform.
    pub fn set_transform(&mut self, transform: Arc<Transform>) {
        if !Arc::ptr_eq(&self.transform, &transform) {
            self.shape = OnceLock::new();
        }
        self.transform = transform;
    }

    /// Points mapped into the world frame.
    pub fn world_points(&self) -> GeometryResult<Vec<Point2>> {
        self.transform.inverse_points(&self.points)
    }

    /// The cached world-space shape.
    pub fn shape(&self) -> GeometryResult<&Shape> {
        self.shape
            .get_or_init(|| {
                let world = self.world_points()?;
                Shape::from_world_points(world, self.closed)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn bbox(&self) -> GeometryResult<BoundingBox> {
        Ok(self.shape()?.bbox())
    }

    /// World-space length; closed contours include the closing segment.
    pub fn length(&self) -> GeometryResult<f64> {
        let world = self.world_points()?;
        let mut total: f64 = world.windows(2).map(|w| w[0].distance(w[1])).sum();
        if self.closed {
            if let (Some(first), Some(last)) = (world.first(), world.last()) {
                total += last.distance(*first);
            }
        }
        Ok(total)
    }

    /// Enclosed world-space area of a closed contour.
    pub fn area(&self) -> GeometryResult<f64> {
        self.shape()?.area()
    }

    /// `true` if the closed boundary runs clockwise in world coordinates.
    ///
    /// Tracings are drawn counter-clockwise by convention, so a clockwise
    /// ring marks a reverse trace.
    pub fn is_reverse(&self) -> GeometryResult<bool> {
        self.shape()?.is_clockwise()
    }

    /// Similarity score against `other` using [`OVERLAP_THRESHOLD`].
    pub fn overlaps(&self, other: &Contour) -> GeometryResult<f64> {
        self.overlaps_with(other, OVERLAP_THRESHOLD)
    }

    /// Similarity score against `other`.
    ///
    /// - `0`: unrelated (disjoint boxes, different kinds, no shared area,
    ///   different vertex counts, or a vertex further apart than `threshold`)
    /// - `1`: the same object within `threshold`
    /// - `> threshold`: closed contours that overlap; union area over
    ///   intersection area, larger meaning more different
    pub fn overlaps_with(&self, other: &Contour, threshold: f64) -> GeometryResult<f64> {
        let mine = self.shape()?;
        let theirs = other.shape()?;

        if !mine.bbox().intersects(&theirs.bbox()) {
            return Ok(0.0);
        }
        if self.closed != other.closed {
            return Ok(0.0);
        }

        match (mine, theirs) {
            (Shape::Polygon(a), Shape::Polygon(b)) => {
                let areas = overlap_areas(a, b);
                match areas.ratio() {
                    None => Ok(0.0),
                    Some(ratio) if ratio <= threshold => Ok(1.0),
                    Some(ratio) => Ok(ratio),
                }
            }
            (Shape::Polyline(a), Shape::Polyline(b)) => {
                if a.vertices().len() != b.vertices().len() {
                    return Ok(0.0);
                }
                let apart = a
                    .vertices()
                    .iter()
                    .zip(b.vertices())
                    .any(|(p, q)| p.distance(*q) > threshold);
                Ok(if apart { 0.0 } else { 1.0 })
            }
            _ => Ok(0.0),
        }
    }

    /// Exact equality of the stored tracing (kind, local points, transform).
    pub fn same_trace(&self, other: &Contour) -> bool {
        self.closed == other.closed
            && self.points == other.points
            && *self.transform == *other.transform
    }

    /// Figures a person (or a policy) needs to choose between candidates.
    pub fn summary(&self) -> ContourSummary {
        ContourSummary {
            name: self.name.clone(),
            closed: self.closed,
            points: self.points.len(),
            bbox: self.bbox().ok(),
            area: if self.closed { self.area().ok() } else { None },
            length: self.length().ok(),
        }
    }
}

impl PartialEq for Contour {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.style == other.style && self.same_trace(other)
    }
}

/// A compact, printable description of one contour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourSummary {
    pub name: String,
    pub closed: bool,
    pub points: usize,
    pub bbox: Option<BoundingBox>,
    pub area: Option<f64>,
    pub length: Option<f64>,
}

impl fmt::Display for ContourSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.closed { "closed" } else { "open" };
        write!(f, "{} ({kind}, {} pts", self.name, self.points)?;
        match &self.bbox {
            Some(b) => write!(f, ", bbox {b}")?,
            None => write!(f, ", no shape")?,
        }
        if let Some(area) = self.area {
            write!(f, ", area {area:.4}")?;
        }
        if let Some(length) = self.length {
            write!(f, ", length {length:.4}")?;
        }
        write!(f, ")")
    }
}
