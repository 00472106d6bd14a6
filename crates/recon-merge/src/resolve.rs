//! Conflict reports and the resolver seam.

use std::fmt;

use serde::{Deserialize, Serialize};

use recon_record::ContourSummary;

use crate::config::ConflictPolicy;

/// Decision for one conflicting contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Keep side A's version; drops the contour if A deleted it.
    TakeA,
    /// Keep side B's version; drops the contour if B deleted it.
    TakeB,
    /// Keep both versions under suffixed names.
    KeepBoth,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::TakeA => write!(f, "take A"),
            Resolution::TakeB => write!(f, "take B"),
            Resolution::KeepBoth => write!(f, "keep both"),
        }
    }
}

/// What a resolver sees of a conflict: one summary per candidate.
///
/// `a` or `b` is `None` when that side deleted a contour the other side
/// modified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub name: String,
    /// Overlap score between the two sides, when both are present.
    pub score: Option<f64>,
    pub a: Option<ContourSummary>,
    pub b: Option<ContourSummary>,
    pub ancestor: Option<ContourSummary>,
}

impl Conflict {
    /// Modified on one side, deleted on the other.
    pub fn is_modify_delete(&self) -> bool {
        self.a.is_none() || self.b.is_none()
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(score) = self.score {
            write!(f, " (overlap {score:.4})")?;
        }
        Ok(())
    }
}

/// Decides conflicts the engine cannot settle on its own.
///
/// Returning `None` leaves the conflict unresolved, which fails the merge.
pub trait ConflictResolver {
    fn resolve(&mut self, conflict: &Conflict) -> Option<Resolution>;
}

impl ConflictResolver for ConflictPolicy {
    fn resolve(&mut self, _conflict: &Conflict) -> Option<Resolution> {
        match self {
            ConflictPolicy::Escalate => None,
            ConflictPolicy::PreferA => Some(Resolution::TakeA),
            ConflictPolicy::PreferB => Some(Resolution::TakeB),
            ConflictPolicy::KeepBoth => Some(Resolution::KeepBoth),
        }
    }
}
