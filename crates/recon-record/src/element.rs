//! The element stream a codec reads and writes.
//!
//! Documents list transforms followed by the images and contours drawn
//! under them. [`RecordBuilder`] folds that stream into a [`Record`],
//! giving every contour a shared handle to the transform it was declared
//! under; [`Record::to_elements`] produces the stream back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use recon_geometry::{Point2, Transform, TransformSpec};

use crate::contour::{Contour, ContourStyle};
use crate::error::{RecordError, RecordResult};
use crate::record::{Image, Record, Section, Series};

/// Record-level metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordHeader {
    Section {
        #[serde(default)]
        name: String,
        index: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thickness: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alignment_locked: Option<bool>,
    },
    Series {
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewport: Option<Point2>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourSpec {
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    pub points: Vec<Point2>,
    #[serde(default)]
    pub style: ContourStyle,
}

/// One object in a record document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// Applies to every following image and contour until the next transform.
    Transform(TransformSpec),
    Image(ImageSpec),
    Contour(ContourSpec),
}

/// Folds an element stream into a [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    header: RecordHeader,
    current: Arc<Transform>,
    image: Option<Image>,
    contours: Vec<Contour>,
}

impl RecordBuilder {
    /// Start a record. Elements before the first transform use the identity.
    pub fn new(header: RecordHeader) -> Self {
        Self {
            header,
            current: Arc::new(Transform::identity()),
            image: None,
            contours: Vec::new(),
        }
    }

    pub fn push(&mut self, element: Element) -> RecordResult<()> {
        match element {
            Element::Transform(spec) => {
                let transform = Transform::new(spec);
                if !transform.is_usable() {
                    warn!(dim = ?transform.dim(), "transform without a usable mapping");
                }
                self.current = Arc::new(transform);
            }
            Element::Image(spec) => {
                if matches!(self.header, RecordHeader::Series { .. }) {
                    return Err(RecordError::InvalidRecord(
                        "series records cannot carry an image".into(),
                    ));
                }
                if self.image.is_some() {
                    return Err(RecordError::InvalidRecord(
                        "section declares more than one image".into(),
                    ));
                }
                self.image = Some(Image {
                    src: spec.src,
                    mag: spec.mag,
                    contrast: spec.contrast,
                    brightness: spec.brightness,
                    transform: Arc::clone(&self.current),
                });
            }
            Element::Contour(spec) => {
                let contour = Contour::new(spec.name, spec.closed, spec.points, Arc::clone(&self.current))
                    .with_style(spec.style);
                self.contours.push(contour);
            }
        }
        Ok(())
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) -> RecordResult<()> {
        elements.into_iter().try_for_each(|e| self.push(e))
    }

    pub fn build(self) -> Record {
        match self.header {
            RecordHeader::Section {
                name,
                index,
                thickness,
                alignment_locked,
            } => Record::Section(Section {
                name,
                index,
                thickness,
                alignment_locked,
                image: self.image,
                contours: self.contours,
            }),
            RecordHeader::Series {
                name,
                index,
                viewport,
                units,
            } => Record::Series(Series {
                name,
                index,
                viewport,
                units,
                contours: self.contours,
            }),
        }
    }
}

impl Record {
    pub fn header(&self) -> RecordHeader {
        match self {
            Record::Section(s) => RecordHeader::Section {
                name: s.name.clone(),
                index: s.index,
                thickness: s.thickness,
                alignment_locked: s.alignment_locked,
            },
            Record::Series(s) => RecordHeader::Series {
                name: s.name.clone(),
                index: s.index,
                viewport: s.viewport,
                units: s.units.clone(),
            },
        }
    }

    /// Flatten into an element stream, emitting a transform element only
    /// when the next object uses a different transform handle.
    pub fn to_elements(&self) -> Vec<Element> {
        fn changes(current: Option<&Arc<Transform>>, next: &Arc<Transform>) -> bool {
            !current.is_some_and(|c| Arc::ptr_eq(c, next))
        }

        let mut out = Vec::new();
        let mut current: Option<&Arc<Transform>> = None;

        if let Record::Section(Section { image: Some(image), .. }) = self {
            if changes(current, &image.transform) {
                out.push(Element::Transform(image.transform.spec().clone()));
            }
            current = Some(&image.transform);
            out.push(Element::Image(ImageSpec {
                src: image.src.clone(),
                mag: image.mag,
                contrast: image.contrast,
                brightness: image.brightness,
            }));
        }

        for c in self.contours() {
            if changes(current, c.transform()) {
                out.push(Element::Transform(c.transform().spec().clone()));
            }
            current = Some(c.transform());
            out.push(Element::Contour(ContourSpec {
                name: c.name().to_string(),
                closed: c.closed(),
                points: c.points().to_vec(),
                style: c.style().clone(),
            }));
        }
        out
    }
}
