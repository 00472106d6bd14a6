use std::fmt;

use serde::{Deserialize, Serialize};

/// How one contour relates across the two sides (and the ancestor, if known).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeClass {
    /// Same object on both sides.
    Identical,
    /// Only side A differs from the ancestor.
    SideAChanged,
    /// Only side B differs from the ancestor.
    SideBChanged,
    /// Both sides diverge, or no ancestor can tell them apart.
    Conflict,
    AddedInA,
    AddedInB,
    /// Deleted on side A, untouched on side B.
    RemovedInA,
    /// Deleted on side B, untouched on side A.
    RemovedInB,
    RemovedInBoth,
}

impl MergeClass {
    /// Whether the engine can settle this class without a resolver.
    pub fn is_automatic(self) -> bool {
        self != MergeClass::Conflict
    }
}

impl fmt::Display for MergeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeClass::Identical => "identical",
            MergeClass::SideAChanged => "changed in A",
            MergeClass::SideBChanged => "changed in B",
            MergeClass::Conflict => "conflict",
            MergeClass::AddedInA => "added in A",
            MergeClass::AddedInB => "added in B",
            MergeClass::RemovedInA => "removed in A",
            MergeClass::RemovedInB => "removed in B",
            MergeClass::RemovedInBoth => "removed in both",
        };
        f.write_str(s)
    }
}
