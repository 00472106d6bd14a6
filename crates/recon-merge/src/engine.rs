//! The merge engine.
//!
//! Merging happens in two steps. [`MergeEngine::plan`] matches contours by
//! name and similarity and classifies each one; nothing is decided yet.
//! [`MergePlan::resolve`] then asks a [`ConflictResolver`] about every
//! conflict and materializes the merged record. Neither step touches the
//! filesystem.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use recon_record::{Contour, Record};

use crate::class::MergeClass;
use crate::config::{KeepBothSuffixes, MergeConfig};
use crate::error::{MergeError, MergeResult};
use crate::pairing::{is_same, pair};
use crate::resolve::{Conflict, ConflictResolver, Resolution};

/// One classified contour (or pair of contours) awaiting resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeEntry {
    pub name: String,
    pub class: MergeClass,
    /// Overlap score between the two sides, when both are present.
    pub score: Option<f64>,
    pub a: Option<Contour>,
    pub b: Option<Contour>,
    pub ancestor: Option<Contour>,
}

impl MergeEntry {
    fn new(
        name: &str,
        class: MergeClass,
        score: Option<f64>,
        a: Option<&Contour>,
        b: Option<&Contour>,
        ancestor: Option<&Contour>,
    ) -> Self {
        debug!(name, class = %class, score = ?score, "classified contour");
        Self {
            name: name.to_string(),
            class,
            score,
            a: a.cloned(),
            b: b.cloned(),
            ancestor: ancestor.cloned(),
        }
    }

    /// Report for a resolver.
    pub fn conflict(&self) -> Conflict {
        Conflict {
            name: self.name.clone(),
            score: self.score,
            a: self.a.as_ref().map(Contour::summary),
            b: self.b.as_ref().map(Contour::summary),
            ancestor: self.ancestor.as_ref().map(Contour::summary),
        }
    }
}

/// How one name was settled in the merged record.
#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeEntry {
    pub name: String,
    pub class: MergeClass,
    /// The resolver's answer; `None` for automatic classes.
    pub resolution: Option<Resolution>,
}

/// A completed merge.
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub record: Record,
    pub entries: Vec<OutcomeEntry>,
    /// The merged record replaces both inputs; the caller may delete them
    /// once the record is safely persisted.
    pub sources_superseded: bool,
}

impl MergeOutcome {
    /// Class of the first entry called `name`.
    pub fn class_of(&self, name: &str) -> Option<MergeClass> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.class)
    }

    pub fn count(&self, class: MergeClass) -> usize {
        self.entries.iter().filter(|e| e.class == class).count()
    }
}

/// Classified contours, ready for resolution.
#[derive(Clone, Debug)]
pub struct MergePlan {
    base: Record,
    entries: Vec<MergeEntry>,
    suffixes: KeepBothSuffixes,
}

impl MergePlan {
    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &MergeEntry> {
        self.entries.iter().filter(|e| e.class == MergeClass::Conflict)
    }

    /// `true` if no entry needs a resolver.
    pub fn is_clean(&self) -> bool {
        self.conflicts().next().is_none()
    }

    pub fn count(&self, class: MergeClass) -> usize {
        self.entries.iter().filter(|e| e.class == class).count()
    }

    /// Settle every conflict with `resolver` and build the merged record.
    ///
    /// Every conflict is put to the resolver before failing, so the error
    /// lists all the ones it declined.
    pub fn resolve(self, resolver: &mut dyn ConflictResolver) -> MergeResult<MergeOutcome> {
        let mut contours = Vec::new();
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut unresolved = Vec::new();
        let mut taken: HashSet<String> = self.entries.iter().map(|e| e.name.clone()).collect();

        for entry in self.entries {
            let resolution = if entry.class == MergeClass::Conflict {
                let conflict = entry.conflict();
                let answer = resolver.resolve(&conflict);
                if answer.is_none() {
                    unresolved.push(conflict);
                }
                answer
            } else {
                None
            };

            let MergeEntry {
                name, class, a, b, ..
            } = entry;
            match (class, resolution) {
                (MergeClass::Identical | MergeClass::SideAChanged | MergeClass::AddedInA, _) => {
                    contours.extend(a)
                }
                (MergeClass::SideBChanged | MergeClass::AddedInB, _) => contours.extend(b),
                (MergeClass::RemovedInA | MergeClass::RemovedInB | MergeClass::RemovedInBoth, _) => {}
                (MergeClass::Conflict, Some(Resolution::TakeA)) => contours.extend(a),
                (MergeClass::Conflict, Some(Resolution::TakeB)) => contours.extend(b),
                (MergeClass::Conflict, Some(Resolution::KeepBoth)) => match (a, b) {
                    (Some(mut a), Some(mut b)) => {
                        a.set_name(unique_name(&mut taken, &name, &self.suffixes.a));
                        b.set_name(unique_name(&mut taken, &name, &self.suffixes.b));
                        contours.push(a);
                        contours.push(b);
                    }
                    (a, b) => contours.extend(a.into_iter().chain(b)),
                },
                (MergeClass::Conflict, None) => {}
            }
            entries.push(OutcomeEntry {
                name,
                class,
                resolution,
            });
        }

        if !unresolved.is_empty() {
            return Err(MergeError::UnresolvedConflicts(unresolved));
        }
        debug!(contours = contours.len(), entries = entries.len(), "merge resolved");
        Ok(MergeOutcome {
            record: self.base.with_contours(contours),
            entries,
            sources_superseded: true,
        })
    }
}

/// `<name><suffix>`, or `<name><suffix>_<n>` with the smallest `n >= 2`
/// that no other contour uses.
fn unique_name(taken: &mut HashSet<String>, name: &str, suffix: &str) -> String {
    let base = format!("{name}{suffix}");
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Matches and classifies contours of two divergent records.
#[derive(Clone, Debug, Default)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Classify every contour of `a` and `b`, using `ancestor` when known.
    ///
    /// The merged record takes its metadata from `a`.
    pub fn plan(&self, ancestor: Option<&Record>, a: &Record, b: &Record) -> MergeResult<MergePlan> {
        check_compatible(a, b)?;
        if let Some(o) = ancestor {
            check_compatible(a, o)?;
        }

        let threshold = self.config.threshold;
        let mut entries = Vec::new();
        for name in ordered_names(ancestor, a, b) {
            let in_o: Vec<&Contour> = ancestor
                .map(|o| o.contours_named(name).collect())
                .unwrap_or_default();
            let in_a: Vec<&Contour> = a.contours_named(name).collect();
            let in_b: Vec<&Contour> = b.contours_named(name).collect();
            entries.extend(classify(name, &in_o, &in_a, &in_b, threshold));
        }

        Ok(MergePlan {
            base: a.with_contours(Vec::new()),
            entries,
            suffixes: self.config.keep_both_suffixes.clone(),
        })
    }

    /// Plan and resolve in one step using the configured policy.
    pub fn merge(&self, ancestor: Option<&Record>, a: &Record, b: &Record) -> MergeResult<MergeOutcome> {
        let mut policy = self.config.policy;
        self.plan(ancestor, a, b)?.resolve(&mut policy)
    }
}

/// Merge `a` and `b` under `config`, asking `resolver` about conflicts.
pub fn merge_records(
    ancestor: Option<&Record>,
    a: &Record,
    b: &Record,
    config: &MergeConfig,
    resolver: &mut dyn ConflictResolver,
) -> MergeResult<MergeOutcome> {
    MergeEngine::new(config.clone()).plan(ancestor, a, b)?.resolve(resolver)
}

fn check_compatible(left: &Record, right: &Record) -> MergeResult<()> {
    if left.kind() != right.kind() {
        return Err(MergeError::KindMismatch {
            left: left.kind(),
            right: right.kind(),
        });
    }
    if let (Some(l), Some(r)) = (left.section_index(), right.section_index()) {
        if l != r {
            return Err(MergeError::SectionIndexMismatch { left: l, right: r });
        }
    }
    Ok(())
}

/// Ancestor names in their order, then names on both sides, then names only
/// in `a`, then names only in `b`; the last three groups sorted.
fn ordered_names<'r>(ancestor: Option<&'r Record>, a: &'r Record, b: &'r Record) -> Vec<&'r str> {
    let mut out: Vec<&str> = ancestor.map(Record::names).unwrap_or_default();
    let seen: HashSet<&str> = out.iter().copied().collect();
    let in_a: BTreeSet<&str> = a.names().into_iter().filter(|n| !seen.contains(n)).collect();
    let in_b: BTreeSet<&str> = b.names().into_iter().filter(|n| !seen.contains(n)).collect();
    out.extend(in_a.intersection(&in_b).copied());
    out.extend(in_a.difference(&in_b).copied());
    out.extend(in_b.difference(&in_a).copied());
    out
}

enum Pending {
    /// Both sides hold the same object, which matches no ancestor copy.
    Same(usize, usize),
    Pair(usize, usize, f64),
    OnlyA(usize),
    OnlyB(usize),
}

fn claim_same(pool: &[&Contour], claimed: &mut [bool], c: &Contour, threshold: f64) -> Option<usize> {
    let k = (0..pool.len()).find(|&k| !claimed[k] && is_same(pool[k], c, threshold))?;
    claimed[k] = true;
    Some(k)
}

fn claim_any(claimed: &mut [bool]) -> Option<usize> {
    let k = claimed.iter().position(|c| !c)?;
    claimed[k] = true;
    Some(k)
}

/// Classify all copies of one name.
///
/// Ancestor copies are consumed as they are matched: first by copies that
/// left them untouched, then by edits (identical or conflicting), and
/// whatever no side claims was removed by both.
fn classify(name: &str, o: &[&Contour], a: &[&Contour], b: &[&Contour], threshold: f64) -> Vec<MergeEntry> {
    let pairing = pair(a, b, threshold);
    let mut claimed = vec![false; o.len()];
    let mut slots: Vec<Option<MergeEntry>> = Vec::new();
    let mut pending = Vec::new();
    let anc = |k: Option<usize>| k.map(|k| o[k]);

    for &(i, j, score) in &pairing.pairs {
        let settled = if score == 1.0 {
            claim_same(o, &mut claimed, a[i], threshold).map(|k| (MergeClass::Identical, Some(k)))
        } else if let Some(k) = claim_same(o, &mut claimed, a[i], threshold) {
            Some((MergeClass::SideBChanged, Some(k)))
        } else {
            claim_same(o, &mut claimed, b[j], threshold).map(|k| (MergeClass::SideAChanged, Some(k)))
        };
        match settled {
            Some((class, k)) => {
                slots.push(Some(MergeEntry::new(name, class, Some(score), Some(a[i]), Some(b[j]), anc(k))))
            }
            None if score == 1.0 => {
                pending.push((slots.len(), Pending::Same(i, j)));
                slots.push(None);
            }
            None => {
                pending.push((slots.len(), Pending::Pair(i, j, score)));
                slots.push(None);
            }
        }
    }
    for &i in &pairing.only_a {
        match claim_same(o, &mut claimed, a[i], threshold) {
            Some(k) => slots.push(Some(MergeEntry::new(
                name,
                MergeClass::RemovedInB,
                None,
                Some(a[i]),
                None,
                Some(o[k]),
            ))),
            None => {
                pending.push((slots.len(), Pending::OnlyA(i)));
                slots.push(None);
            }
        }
    }
    for &j in &pairing.only_b {
        match claim_same(o, &mut claimed, b[j], threshold) {
            Some(k) => slots.push(Some(MergeEntry::new(
                name,
                MergeClass::RemovedInA,
                None,
                None,
                Some(b[j]),
                Some(o[k]),
            ))),
            None => {
                pending.push((slots.len(), Pending::OnlyB(j)));
                slots.push(None);
            }
        }
    }

    for (slot, p) in pending {
        let k = claim_any(&mut claimed);
        let entry = match p {
            Pending::Same(i, j) => {
                MergeEntry::new(name, MergeClass::Identical, Some(1.0), Some(a[i]), Some(b[j]), anc(k))
            }
            Pending::Pair(i, j, score) => {
                MergeEntry::new(name, MergeClass::Conflict, Some(score), Some(a[i]), Some(b[j]), anc(k))
            }
            Pending::OnlyA(i) => {
                let class = if k.is_some() {
                    MergeClass::Conflict
                } else {
                    MergeClass::AddedInA
                };
                MergeEntry::new(name, class, None, Some(a[i]), None, anc(k))
            }
            Pending::OnlyB(j) => {
                let class = if k.is_some() {
                    MergeClass::Conflict
                } else {
                    MergeClass::AddedInB
                };
                MergeEntry::new(name, class, None, None, Some(b[j]), anc(k))
            }
        };
        slots[slot] = Some(entry);
    }

    for (k, _) in claimed.iter().enumerate().filter(|(_, c)| !**c) {
        slots.push(Some(MergeEntry::new(
            name,
            MergeClass::RemovedInBoth,
            None,
            None,
            None,
            Some(o[k]),
        )));
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictPolicy;
    use proptest::prelude::*;
    use recon_geometry::{Point2, Transform};
    use recon_record::{Section, Series};
    use std::sync::Arc;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn square(name: &str, x: f64, y: f64, size: f64) -> Contour {
        Contour::new(
            name,
            true,
            vec![
                Point2::new(x, y),
                Point2::new(x + size, y),
                Point2::new(x + size, y + size),
                Point2::new(x, y + size),
            ],
            Arc::new(Transform::identity()),
        )
    }

    fn section(contours: Vec<Contour>) -> Record {
        Record::Section(Section {
            name: "BBCHZ".into(),
            index: 12,
            thickness: Some(0.05),
            alignment_locked: None,
            image: None,
            contours,
        })
    }

    fn names(record: &Record) -> Vec<&str> {
        record.contours().iter().map(Contour::name).collect()
    }

    fn engine(policy: ConflictPolicy) -> MergeEngine {
        MergeEngine::new(MergeConfig::with_policy(policy))
    }

    struct Recording {
        seen: Vec<Conflict>,
        answer: Option<Resolution>,
    }

    impl ConflictResolver for Recording {
        fn resolve(&mut self, conflict: &Conflict) -> Option<Resolution> {
            self.seen.push(conflict.clone());
            self.answer
        }
    }

    // -----------------------------------------------------------------------
    // Two-way merges
    // -----------------------------------------------------------------------

    #[test]
    fn identical_contour_is_kept_once() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let out = MergeEngine::default().merge(None, &a, &b).unwrap();
        assert_eq!(names(&out.record), ["d1"]);
        assert_eq!(out.class_of("d1"), Some(MergeClass::Identical));
        assert!(out.sources_superseded);
    }

    #[test]
    fn contour_only_in_b_is_added_and_not_conflicting() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 0.0, 0.0, 10.0), square("cell3", 50.0, 50.0, 5.0)]);
        let plan = MergeEngine::default().plan(None, &a, &b).unwrap();
        assert!(plan.is_clean());
        assert!(plan.conflicts().all(|e| e.name != "cell3"));
        let out = plan.resolve(&mut ConflictPolicy::Escalate).unwrap();
        assert_eq!(out.class_of("cell3"), Some(MergeClass::AddedInB));
        assert!(out.record.contour("cell3").is_some());
    }

    #[test]
    fn middling_overlap_without_ancestor_escalates() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 1.0, 0.0, 10.0)]);
        let plan = MergeEngine::default().plan(None, &a, &b).unwrap();
        let conflict = plan.conflicts().next().unwrap().conflict();
        assert!((conflict.score.unwrap() - 110.0 / 90.0).abs() < 1e-9);
        assert_eq!(conflict.a.as_ref().unwrap().points, 4);
        assert!(conflict.b.is_some());
        assert!(conflict.ancestor.is_none());

        let err = plan.resolve(&mut ConflictPolicy::Escalate).unwrap_err();
        match err {
            MergeError::UnresolvedConflicts(cs) => {
                assert_eq!(cs.len(), 1);
                assert_eq!(cs[0].name, "d1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn policies_pick_a_side() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 1.0, 0.0, 10.0)]);

        let out = engine(ConflictPolicy::PreferA).merge(None, &a, &b).unwrap();
        assert_eq!(out.record.contours()[0].points()[0].x, 0.0);
        assert_eq!(out.entries[0].resolution, Some(Resolution::TakeA));

        let out = engine(ConflictPolicy::PreferB).merge(None, &a, &b).unwrap();
        assert_eq!(out.record.contours()[0].points()[0].x, 1.0);
    }

    #[test]
    fn keep_both_renames_with_suffixes() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 1.0, 0.0, 10.0)]);
        let out = engine(ConflictPolicy::KeepBoth).merge(None, &a, &b).unwrap();
        assert_eq!(names(&out.record), ["d1_a", "d1_b"]);

        let mut config = MergeConfig::with_policy(ConflictPolicy::KeepBoth);
        config.keep_both_suffixes.b = "_theirs".into();
        let out = MergeEngine::new(config).merge(None, &a, &b).unwrap();
        assert_eq!(names(&out.record), ["d1_a", "d1_theirs"]);
    }

    #[test]
    fn keep_both_avoids_existing_names() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0), square("d1_a", 100.0, 0.0, 10.0)]);
        let b = section(vec![
            square("d1", 1.0, 0.0, 10.0),
            square("d1_a", 100.0, 0.0, 10.0),
            square("d1_b", 200.0, 0.0, 10.0),
        ]);
        let out = engine(ConflictPolicy::KeepBoth).merge(None, &a, &b).unwrap();
        let mut merged = names(&out.record);
        merged.sort_unstable();
        assert_eq!(merged, ["d1_a", "d1_a_2", "d1_b", "d1_b_2"]);
    }

    #[test]
    fn resolver_sees_every_conflict() {
        let a = section(vec![square("x", 0.0, 0.0, 10.0), square("y", 100.0, 0.0, 10.0)]);
        let b = section(vec![square("x", 2.0, 0.0, 10.0), square("y", 102.0, 0.0, 10.0)]);
        let mut resolver = Recording {
            seen: Vec::new(),
            answer: None,
        };
        let err = MergeEngine::default()
            .plan(None, &a, &b)
            .unwrap()
            .resolve(&mut resolver)
            .unwrap_err();
        assert_eq!(resolver.seen.len(), 2);
        assert!(err.to_string().contains("x, y"), "{err}");
    }

    #[test]
    fn merge_records_uses_the_given_resolver() {
        let a = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 1.0, 0.0, 10.0)]);
        let mut resolver = Recording {
            seen: Vec::new(),
            answer: Some(Resolution::TakeB),
        };
        let out = merge_records(None, &a, &b, &MergeConfig::default(), &mut resolver).unwrap();
        assert_eq!(resolver.seen.len(), 1);
        assert_eq!(out.record.contours()[0].points()[0].x, 1.0);
    }

    #[test]
    fn metadata_comes_from_a() {
        let a = section(vec![]);
        let mut b = section(vec![]);
        if let Record::Section(s) = &mut b {
            s.thickness = Some(0.1);
        }
        let out = MergeEngine::default().merge(None, &a, &b).unwrap();
        match out.record {
            Record::Section(s) => assert_eq!(s.thickness, Some(0.05)),
            other => panic!("expected section, got {other:?}"),
        }
    }

    #[test]
    fn incompatible_records_are_rejected() {
        let a = section(vec![]);
        let series = Record::Series(Series {
            name: "BBCHZ".into(),
            index: None,
            viewport: None,
            units: None,
            contours: vec![],
        });
        assert!(matches!(
            MergeEngine::default().plan(None, &a, &series),
            Err(MergeError::KindMismatch { .. })
        ));

        let mut other = section(vec![]);
        if let Record::Section(s) = &mut other {
            s.index = 13;
        }
        assert!(matches!(
            MergeEngine::default().plan(None, &a, &other),
            Err(MergeError::SectionIndexMismatch { left: 12, right: 13 })
        ));
    }

    // -----------------------------------------------------------------------
    // Three-way merges
    // -----------------------------------------------------------------------

    #[test]
    fn one_sided_edits_resolve_automatically() {
        let o = section(vec![square("d1", 0.0, 0.0, 10.0), square("d2", 50.0, 0.0, 10.0)]);
        let a = section(vec![square("d1", 0.0, 0.0, 10.0), square("d2", 52.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 3.0, 0.0, 10.0), square("d2", 50.0, 0.0, 10.0)]);
        let out = MergeEngine::default().merge(Some(&o), &a, &b).unwrap();
        assert_eq!(out.class_of("d1"), Some(MergeClass::SideBChanged));
        assert_eq!(out.class_of("d2"), Some(MergeClass::SideAChanged));
        assert_eq!(out.record.contour("d1").unwrap().points()[0].x, 3.0);
        assert_eq!(out.record.contour("d2").unwrap().points()[0].x, 52.0);
    }

    #[test]
    fn same_edit_on_both_sides_is_identical_once() {
        let o = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let a = section(vec![square("d1", 5.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 5.0, 0.0, 10.0)]);
        let plan = MergeEngine::default().plan(Some(&o), &a, &b).unwrap();
        assert_eq!(plan.entries().len(), 1);
        assert!(plan.entries()[0].ancestor.is_some());

        let out = plan.resolve(&mut ConflictPolicy::Escalate).unwrap();
        assert_eq!(out.count(MergeClass::Identical), 1);
        assert_eq!(out.count(MergeClass::RemovedInBoth), 0);
        assert_eq!(out.record.contour("d1").unwrap().points()[0].x, 5.0);
    }

    #[test]
    fn both_sides_changing_is_a_conflict() {
        let o = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let a = section(vec![square("d1", 1.0, 0.0, 10.0)]);
        let b = section(vec![square("d1", 2.0, 0.0, 10.0)]);
        let plan = MergeEngine::default().plan(Some(&o), &a, &b).unwrap();
        let entry = plan.conflicts().next().unwrap();
        assert!(entry.ancestor.is_some());
        assert!(entry.conflict().ancestor.is_some());
    }

    #[test]
    fn removals() {
        let o = section(vec![
            square("d1", 0.0, 0.0, 10.0),
            square("d2", 20.0, 0.0, 10.0),
            square("d3", 40.0, 0.0, 10.0),
        ]);
        let a = section(vec![square("d1", 0.0, 0.0, 10.0), square("d2", 20.0, 0.0, 10.0)]);
        let b = section(vec![square("d2", 20.0, 0.0, 10.0)]);
        let out = MergeEngine::default().merge(Some(&o), &a, &b).unwrap();
        assert_eq!(out.class_of("d1"), Some(MergeClass::RemovedInB));
        assert_eq!(out.class_of("d2"), Some(MergeClass::Identical));
        assert_eq!(out.class_of("d3"), Some(MergeClass::RemovedInBoth));
        assert_eq!(names(&out.record), ["d2"]);

        let out = MergeEngine::default().merge(Some(&o), &b, &a).unwrap();
        assert_eq!(out.class_of("d1"), Some(MergeClass::RemovedInA));
    }

    #[test]
    fn modify_delete_needs_a_decision() {
        let o = section(vec![square("d1", 0.0, 0.0, 10.0)]);
        let a = section(vec![square("d1", 4.0, 0.0, 10.0)]);
        let b = section(vec![]);
        let plan = MergeEngine::default().plan(Some(&o), &a, &b).unwrap();
        let conflict = plan.conflicts().next().unwrap().conflict();
        assert!(conflict.is_modify_delete());

        let kept = plan.clone().resolve(&mut ConflictPolicy::PreferA).unwrap();
        assert_eq!(names(&kept.record), ["d1"]);
        let dropped = plan.resolve(&mut ConflictPolicy::PreferB).unwrap();
        assert!(dropped.record.is_empty());
    }

    #[test]
    fn output_order_is_name_stable() {
        let o = section(vec![square("m", 0.0, 0.0, 1.0), square("k", 10.0, 0.0, 1.0)]);
        let a = section(vec![
            square("zeta", 90.0, 0.0, 1.0),
            square("k", 10.0, 0.0, 1.0),
            square("shared", 50.0, 0.0, 1.0),
            square("m", 0.0, 0.0, 1.0),
            square("alpha", 70.0, 0.0, 1.0),
        ]);
        let b = section(vec![
            square("shared", 50.0, 0.0, 1.0),
            square("beta", 80.0, 0.0, 1.0),
            square("m", 0.0, 0.0, 1.0),
            square("k", 10.0, 0.0, 1.0),
        ]);
        let out = MergeEngine::default().merge(Some(&o), &a, &b).unwrap();
        assert_eq!(names(&out.record), ["m", "k", "shared", "alpha", "zeta", "beta"]);
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    fn membership_and_orders() -> impl Strategy<Value = (Vec<(bool, bool)>, Vec<usize>, Vec<usize>)> {
        prop::collection::vec((any::<bool>(), any::<bool>()), 1..10).prop_flat_map(|m| {
            let order = Just((0..m.len()).collect::<Vec<_>>());
            (Just(m), order.clone().prop_shuffle(), order.prop_shuffle())
        })
    }

    fn side(membership: &[(bool, bool)], order: &[usize], pick: fn(&(bool, bool)) -> bool) -> Record {
        section(
            order
                .iter()
                .filter(|&&i| pick(&membership[i]))
                .map(|&i| square(&format!("c{i}"), 20.0 * i as f64, 0.0, 10.0))
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn merge_ignores_declaration_order((membership, order_a, order_b) in membership_and_orders()) {
            let natural: Vec<usize> = (0..membership.len()).collect();
            let engine = MergeEngine::default();

            let expected = engine
                .merge(None, &side(&membership, &natural, |m| m.0), &side(&membership, &natural, |m| m.1))
                .unwrap();
            let shuffled = engine
                .merge(None, &side(&membership, &order_a, |m| m.0), &side(&membership, &order_b, |m| m.1))
                .unwrap();

            prop_assert_eq!(expected.record.contours(), shuffled.record.contours());
            prop_assert_eq!(expected.entries, shuffled.entries);
        }
    }
}
