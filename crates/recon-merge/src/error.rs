//! Error types for the merge crate.

use recon_record::RecordKind;

use crate::resolve::Conflict;

/// Errors that can occur while merging two records.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Conflicts remained after the resolver declined to decide them.
    #[error("{} unresolved conflict(s): {}", .0.len(), conflict_names(.0))]
    UnresolvedConflicts(Vec<Conflict>),

    /// The inputs are not the same kind of record.
    #[error("cannot merge a {left} with a {right}")]
    KindMismatch { left: RecordKind, right: RecordKind },

    /// The inputs are different sections.
    #[error("section index mismatch: {left} vs {right}")]
    SectionIndexMismatch { left: u32, right: u32 },

    /// Geometry failure outside the similarity fallback.
    #[error("geometry error: {0}")]
    Geometry(#[from] recon_geometry::GeometryError),

    /// Record failure.
    #[error("record error: {0}")]
    Record(#[from] recon_record::RecordError),
}

fn conflict_names(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
