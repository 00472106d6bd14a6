//! Records of a serial-section reconstruction.
//!
//! A [`Record`] is either a [`Section`] (one slice: its tracings and image)
//! or a [`Series`] (series-wide tracings and settings). Both hold an ordered
//! list of [`Contour`]s, each bound to a shared [`recon_geometry::Transform`].
//!
//! Records enter and leave the system through a [`RecordCodec`]. The codec
//! works on a flat stream of [`Element`]s (transform, image, contour) that a
//! [`RecordBuilder`] folds back into a record, mirroring how tracings nest
//! under transforms in the on-disk documents.
//!
//! # Design Rules
//!
//! 1. A contour's shape is always derived, never stored.
//! 2. Transforms are shared by handle; identity drives shape cache invalidation.
//! 3. Records are fully decoded before any merge work starts.
//! 4. Persisting writes a temporary file, verifies its digest, then renames.

pub mod codec;
pub mod contour;
pub mod digest;
pub mod element;
pub mod error;
pub mod persist;
pub mod record;

pub use codec::{JsonCodec, RecordCodec, RecordDocument};
pub use contour::{Contour, ContourStyle, ContourSummary};
pub use digest::RecordDigest;
pub use element::{ContourSpec, Element, ImageSpec, RecordBuilder, RecordHeader};
pub use error::{RecordError, RecordResult};
pub use persist::{write_record, write_verified};
pub use record::{Image, Record, RecordKind, Section, Series};
