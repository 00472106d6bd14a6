//! Record codecs.
//!
//! The merge core never parses bytes itself: a [`RecordCodec`] turns a
//! document into a fully materialized [`Record`] and back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{Element, RecordBuilder, RecordHeader};
use crate::error::{RecordError, RecordResult};
use crate::record::Record;

/// Converts between serialized documents and records.
pub trait RecordCodec {
    fn decode(&self, bytes: &[u8]) -> RecordResult<Record>;

    fn encode(&self, record: &Record) -> RecordResult<Vec<u8>>;

    /// Read and decode a file.
    fn decode_path(&self, path: &Path) -> RecordResult<Record> {
        let bytes = fs::read(path).map_err(RecordError::io(path))?;
        let record = self.decode(&bytes)?;
        debug!(path = %path.display(), kind = %record.kind(), contours = record.len(), "decoded record");
        Ok(record)
    }
}

/// Serialized layout used by [`JsonCodec`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub record: RecordHeader,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl RecordDocument {
    pub fn from_record(record: &Record) -> Self {
        Self {
            record: record.header(),
            elements: record.to_elements(),
        }
    }

    pub fn into_record(self) -> RecordResult<Record> {
        let mut builder = RecordBuilder::new(self.record);
        builder.extend(self.elements)?;
        Ok(builder.build())
    }
}

/// JSON documents via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl JsonCodec {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl RecordCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> RecordResult<Record> {
        let doc: RecordDocument =
            serde_json::from_slice(bytes).map_err(|e| RecordError::Decode(e.to_string()))?;
        doc.into_record()
    }

    fn encode(&self, record: &Record) -> RecordResult<Vec<u8>> {
        let doc = RecordDocument::from_record(record);
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&doc)
        } else {
            serde_json::to_vec(&doc)
        };
        bytes.map_err(|e| RecordError::Encode(e.to_string()))
    }
}
