//! Merge engine for divergent section and series records.
//!
//! Two edited copies of a record (and, when available, their common
//! ancestor) are reconciled contour by contour. Contours are matched by name
//! and then by geometric similarity, classified, and settled either
//! automatically or through a [`ConflictResolver`].
//!
//! # Key Types
//!
//! - [`MergeEngine`] -- Plans a merge from two (or three) records
//! - [`MergePlan`] / [`MergeEntry`] -- Classified contours awaiting resolution
//! - [`MergeOutcome`] -- The merged record plus how each name was settled
//! - [`MergeClass`] -- Identical, one-sided change, conflict, addition, removal
//! - [`ConflictResolver`] / [`ConflictPolicy`] / [`Resolution`] -- Conflict decisions
//! - [`MergeConfig`] -- Similarity threshold, default policy, keep-both suffixes

pub mod class;
pub mod config;
pub mod engine;
pub mod error;
pub mod pairing;
pub mod resolve;

pub use class::MergeClass;
pub use config::{ConflictPolicy, KeepBothSuffixes, MergeConfig};
pub use engine::{merge_records, MergeEngine, MergeEntry, MergeOutcome, MergePlan, OutcomeEntry};
pub use error::{MergeError, MergeResult};
pub use pairing::{pair, similarity, Pairing};
pub use resolve::{Conflict, ConflictResolver, Resolution};
