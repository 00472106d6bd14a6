//! Section and series records.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use recon_geometry::{Point2, Transform};

use crate::contour::Contour;

/// Which kind of record a document holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Section,
    Series,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Section => write!(f, "section"),
            RecordKind::Series => write!(f, "series"),
        }
    }
}

/// Image metadata for a section, carried through merges unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub src: String,
    pub mag: Option<f64>,
    pub contrast: Option<f64>,
    pub brightness: Option<f64>,
    pub transform: Arc<Transform>,
}

/// One slice of the series.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub name: String,
    pub index: u32,
    pub thickness: Option<f64>,
    pub alignment_locked: Option<bool>,
    pub image: Option<Image>,
    pub contours: Vec<Contour>,
}

/// Series-wide settings and tracings.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub index: Option<u32>,
    pub viewport: Option<Point2>,
    pub units: Option<String>,
    pub contours: Vec<Contour>,
}

/// The unit version control merges.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Section(Section),
    Series(Series),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Section(_) => RecordKind::Section,
            Record::Series(_) => RecordKind::Series,
        }
    }

    /// Logical name; for sections this excludes the index suffix.
    pub fn name(&self) -> &str {
        match self {
            Record::Section(s) => &s.name,
            Record::Series(s) => &s.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self {
            Record::Section(s) => s.name = name,
            Record::Series(s) => s.name = name,
        }
    }

    /// Section index, `None` for series.
    pub fn section_index(&self) -> Option<u32> {
        match self {
            Record::Section(s) => Some(s.index),
            Record::Series(_) => None,
        }
    }

    /// File name the record is stored under: `<name>.<index>` or `<name>.ser`.
    pub fn file_name(&self) -> String {
        match self {
            Record::Section(s) => format!("{}.{}", s.name, s.index),
            Record::Series(s) => format!("{}.ser", s.name),
        }
    }

    pub fn contours(&self) -> &[Contour] {
        match self {
            Record::Section(s) => &s.contours,
            Record::Series(s) => &s.contours,
        }
    }

    pub fn contours_mut(&mut self) -> &mut Vec<Contour> {
        match self {
            Record::Section(s) => &mut s.contours,
            Record::Series(s) => &mut s.contours,
        }
    }

    /// Copy of this record's metadata holding `contours` instead.
    pub fn with_contours(&self, contours: Vec<Contour>) -> Record {
        let mut out = self.clone();
        *out.contours_mut() = contours;
        out
    }

    /// Number of contours.
    pub fn len(&self) -> usize {
        self.contours().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours().is_empty()
    }

    /// Contour at declaration position `index`.
    pub fn get(&self, index: usize) -> Option<&Contour> {
        self.contours().get(index)
    }

    /// First contour called `name`.
    pub fn contour(&self, name: &str) -> Option<&Contour> {
        self.contours().iter().find(|c| c.name() == name)
    }

    /// Every contour called `name`, in declaration order.
    pub fn contours_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Contour> + 'a {
        self.contours().iter().filter(move |c| c.name() == name)
    }

    /// Distinct contour names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.contours()
            .iter()
            .map(Contour::name)
            .filter(|n| seen.insert(*n))
            .collect()
    }
}
