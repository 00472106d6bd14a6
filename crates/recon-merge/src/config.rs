use serde::{Deserialize, Serialize};

use recon_geometry::OVERLAP_THRESHOLD;

/// What to do with a contour both sides changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Leave the decision to a person; unanswered conflicts fail the merge.
    #[default]
    Escalate,
    PreferA,
    PreferB,
    /// Keep both candidates under suffixed names.
    KeepBoth,
}

/// Name suffixes applied by [`ConflictPolicy::KeepBoth`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepBothSuffixes {
    pub a: String,
    pub b: String,
}

impl Default for KeepBothSuffixes {
    fn default() -> Self {
        Self {
            a: "_a".into(),
            b: "_b".into(),
        }
    }
}

/// Configuration for a merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Overlap ratio at or below which two contours count as the same object.
    pub threshold: f64,
    /// Policy for conflicts no resolver answered.
    pub policy: ConflictPolicy,
    pub keep_both_suffixes: KeepBothSuffixes,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: OVERLAP_THRESHOLD,
            policy: ConflictPolicy::Escalate,
            keep_both_suffixes: KeepBothSuffixes::default(),
        }
    }
}

impl MergeConfig {
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }
}
