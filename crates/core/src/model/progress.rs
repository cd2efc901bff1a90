use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

use crate::model::ids::QuestionId;

//
// ─── STATUS TYPES ──────────────────────────────────────────────────────────────
//

/// The two persisted progress sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Mastered,
    Failed,
}

impl StatusKind {
    pub const ALL: [StatusKind; 2] = [StatusKind::Mastered, StatusKind::Failed];

    /// Segment used in storage keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Mastered => "mastered",
            StatusKind::Failed => "failed",
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            StatusKind::Mastered => StatusKind::Failed,
            StatusKind::Failed => StatusKind::Mastered,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-question status. `Unseen` is never stored; it is absence from both sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionStatus {
    Unseen,
    Failed,
    Mastered,
}

impl QuestionStatus {
    /// Next state in the list-view cycle: unseen → failed → mastered → unseen.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            QuestionStatus::Unseen => QuestionStatus::Failed,
            QuestionStatus::Failed => QuestionStatus::Mastered,
            QuestionStatus::Mastered => QuestionStatus::Unseen,
        }
    }

    #[must_use]
    pub fn kind(self) -> Option<StatusKind> {
        match self {
            QuestionStatus::Unseen => None,
            QuestionStatus::Failed => Some(StatusKind::Failed),
            QuestionStatus::Mastered => Some(StatusKind::Mastered),
        }
    }
}

impl From<StatusKind> for QuestionStatus {
    fn from(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Mastered => QuestionStatus::Mastered,
            StatusKind::Failed => QuestionStatus::Failed,
        }
    }
}

//
// ─── CHANGE SET ────────────────────────────────────────────────────────────────
//

/// Which of the two sets a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[must_use]
pub struct ProgressChange {
    pub mastered: bool,
    pub failed: bool,
}

impl ProgressChange {
    pub const NONE: ProgressChange = ProgressChange {
        mastered: false,
        failed: false,
    };

    pub const BOTH: ProgressChange = ProgressChange {
        mastered: true,
        failed: true,
    };

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.mastered && !self.failed
    }

    #[must_use]
    pub fn touches(self, kind: StatusKind) -> bool {
        match kind {
            StatusKind::Mastered => self.mastered,
            StatusKind::Failed => self.failed,
        }
    }

    fn touch(&mut self, kind: StatusKind) {
        match kind {
            StatusKind::Mastered => self.mastered = true,
            StatusKind::Failed => self.failed = true,
        }
    }
}

/// Live counts for the status filter labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub unseen: usize,
    pub failed: usize,
    pub learned: usize,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Mastered and failed question ids for one subject.
///
/// The two sets are always disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    mastered: BTreeSet<QuestionId>,
    failed: BTreeSet<QuestionId>,
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds progress from persisted sets.
    ///
    /// An id found in both sets is kept in `failed` only.
    #[must_use]
    pub fn from_sets(
        mastered: impl IntoIterator<Item = QuestionId>,
        failed: impl IntoIterator<Item = QuestionId>,
    ) -> Self {
        let failed: BTreeSet<QuestionId> = failed.into_iter().collect();
        let mut mastered: BTreeSet<QuestionId> = mastered.into_iter().collect();
        let before = mastered.len();
        mastered.retain(|id| !failed.contains(id));
        if mastered.len() != before {
            warn!(
                overlapping = before - mastered.len(),
                "progress ids present in both sets; keeping them as failed"
            );
        }
        Self { mastered, failed }
    }

    #[must_use]
    pub fn mastered(&self) -> &BTreeSet<QuestionId> {
        &self.mastered
    }

    #[must_use]
    pub fn failed(&self) -> &BTreeSet<QuestionId> {
        &self.failed
    }

    #[must_use]
    pub fn ids(&self, kind: StatusKind) -> &BTreeSet<QuestionId> {
        match kind {
            StatusKind::Mastered => &self.mastered,
            StatusKind::Failed => &self.failed,
        }
    }

    fn ids_mut(&mut self, kind: StatusKind) -> &mut BTreeSet<QuestionId> {
        match kind {
            StatusKind::Mastered => &mut self.mastered,
            StatusKind::Failed => &mut self.failed,
        }
    }

    #[must_use]
    pub fn status_of(&self, id: QuestionId) -> QuestionStatus {
        if self.mastered.contains(&id) {
            QuestionStatus::Mastered
        } else if self.failed.contains(&id) {
            QuestionStatus::Failed
        } else {
            QuestionStatus::Unseen
        }
    }

    #[must_use]
    pub fn is_unseen(&self, id: QuestionId) -> bool {
        !self.mastered.contains(&id) && !self.failed.contains(&id)
    }

    /// Adds `id` to `kind` and removes it from the other set.
    pub fn mark(&mut self, id: QuestionId, kind: StatusKind) -> ProgressChange {
        let mut change = ProgressChange::NONE;
        if self.ids_mut(kind.other()).remove(&id) {
            change.touch(kind.other());
        }
        if self.ids_mut(kind).insert(id) {
            change.touch(kind);
        }
        change
    }

    /// Moves `id` to exactly `status`.
    pub fn set_status(&mut self, id: QuestionId, status: QuestionStatus) -> ProgressChange {
        match status.kind() {
            Some(kind) => self.mark(id, kind),
            None => {
                let mut change = ProgressChange::NONE;
                for kind in StatusKind::ALL {
                    if self.ids_mut(kind).remove(&id) {
                        change.touch(kind);
                    }
                }
                change
            }
        }
    }

    /// Advances `id` one step through unseen → failed → mastered → unseen.
    pub fn cycle(&mut self, id: QuestionId) -> (QuestionStatus, ProgressChange) {
        let next = self.status_of(id).next();
        let change = self.set_status(id, next);
        (next, change)
    }

    /// Empties both sets.
    pub fn clear(&mut self) -> ProgressChange {
        self.mastered.clear();
        self.failed.clear();
        ProgressChange::BOTH
    }

    /// Counts over all `ids` of a subject.
    ///
    /// Stale ids in the sets that are not part of `ids` are ignored.
    #[must_use]
    pub fn counts<I>(&self, ids: I) -> StatusCounts
    where
        I: IntoIterator<Item = QuestionId>,
    {
        let mut counts = StatusCounts::default();
        for id in ids {
            counts.total += 1;
            match self.status_of(id) {
                QuestionStatus::Unseen => counts.unseen += 1,
                QuestionStatus::Failed => counts.failed += 1,
                QuestionStatus::Mastered => counts.learned += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(v: u64) -> QuestionId {
        QuestionId::new(v)
    }

    fn assert_disjoint(p: &Progress) {
        assert!(p.mastered().is_disjoint(p.failed()));
    }

    #[test]
    fn mark_known_then_failed_leaves_failed() {
        let mut p = Progress::new();
        let c1 = p.mark(id(1), StatusKind::Mastered);
        assert_eq!(c1, ProgressChange { mastered: true, failed: false });
        let c2 = p.mark(id(1), StatusKind::Failed);
        assert_eq!(c2, ProgressChange::BOTH);
        assert_eq!(p.status_of(id(1)), QuestionStatus::Failed);
        assert!(!p.mastered().contains(&id(1)));
        assert_disjoint(&p);
    }

    #[test]
    fn mark_is_idempotent() {
        let mut p = Progress::new();
        let _ = p.mark(id(4), StatusKind::Mastered);
        let change = p.mark(id(4), StatusKind::Mastered);
        assert!(change.is_empty());
        assert_eq!(p.mastered().len(), 1);
    }

    #[test]
    fn cycle_visits_three_states_and_returns() {
        let mut p = Progress::new();
        let (s1, _) = p.cycle(id(9));
        assert_eq!(s1, QuestionStatus::Failed);
        assert_disjoint(&p);
        let (s2, change) = p.cycle(id(9));
        assert_eq!(s2, QuestionStatus::Mastered);
        assert_eq!(change, ProgressChange::BOTH);
        assert_disjoint(&p);
        let (s3, change) = p.cycle(id(9));
        assert_eq!(s3, QuestionStatus::Unseen);
        assert_eq!(change, ProgressChange { mastered: true, failed: false });
        assert!(p.is_unseen(id(9)));
    }

    #[test]
    fn cycle_from_mastered_starts_at_unseen() {
        let mut p = Progress::from_sets([id(1)], []);
        assert_eq!(p.cycle(id(1)).0, QuestionStatus::Unseen);
        assert_eq!(p.cycle(id(1)).0, QuestionStatus::Failed);
        assert_eq!(p.cycle(id(1)).0, QuestionStatus::Mastered);
    }

    #[test]
    fn from_sets_repairs_overlap_in_favor_of_failed() {
        let p = Progress::from_sets([id(1), id(2)], [id(2), id(3)]);
        assert_eq!(p.mastered().iter().copied().collect::<Vec<_>>(), vec![id(1)]);
        assert_eq!(p.status_of(id(2)), QuestionStatus::Failed);
        assert_disjoint(&p);
    }

    #[test]
    fn counts_ignore_ids_outside_subject() {
        let p = Progress::from_sets([id(1), id(99)], [id(2)]);
        let counts = p.counts([1, 2, 3, 4].map(id));
        assert_eq!(
            counts,
            StatusCounts {
                total: 4,
                unseen: 2,
                failed: 1,
                learned: 1
            }
        );
    }

    #[test]
    fn clear_empties_both_sets() {
        let mut p = Progress::from_sets([id(1)], [id(2)]);
        assert_eq!(p.clear(), ProgressChange::BOTH);
        assert!(p.mastered().is_empty());
        assert!(p.failed().is_empty());
    }
}
