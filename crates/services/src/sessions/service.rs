use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use kioku_core::Clock;
use kioku_core::derive_working_set;
use kioku_core::gesture::SwipeOutcome;
use kioku_core::model::{
    CardFace, CategoryFilter, EmptyState, Progress, ProgressChange, Question, QuestionId,
    QuestionStatus, StatusCounts, StatusFilter, StatusKind, Subject, SubjectId,
};
use storage::ProgressStore;

use super::config::SessionConfig;
use super::selection::{Direction, Selection, ViewMode};
use super::shuffle::{shuffle, shuffle_with};
use super::view::{CardView, ListRow};
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// A mark waiting for the reveal pause to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommit {
    pub question_id: QuestionId,
    pub kind: StatusKind,
    pub due_at: DateTime<Utc>,
}

/// Result of a mark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Progress was updated and the cursor moved on.
    Committed(QuestionId),
    /// The answer was revealed; the mark applies once `due_at` passes.
    Deferred {
        question_id: QuestionId,
        due_at: DateTime<Utc>,
    },
    /// A swipe ended short of the threshold.
    Cancelled,
    /// The working set is empty.
    NoCard,
}

/// Proof that the learner was asked to confirm a progress reset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ResetRequest {
    subject: SubjectId,
}

impl ResetRequest {
    #[must_use]
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Study session over one subject.
///
/// The working set is recomputed from the selection and progress on every
/// call; nothing derived is cached.
pub struct StudySession {
    subject: Arc<Subject>,
    progress: Progress,
    selection: Selection,
    revealed: bool,
    pending: Option<PendingCommit>,
    store: ProgressStore,
    clock: Clock,
    config: SessionConfig,
}

impl StudySession {
    /// Loads progress for `subject` and starts with default filters.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the backend cannot be read.
    pub async fn open(
        subject: Arc<Subject>,
        store: ProgressStore,
        clock: Clock,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let progress = store.load(subject.id()).await?;
        info!(
            subject = %subject.id(),
            questions = subject.questions().len(),
            mastered = progress.mastered().len(),
            failed = progress.failed().len(),
            "study session opened"
        );
        Ok(Self {
            selection: Selection::new(subject.questions().len()),
            subject,
            progress,
            revealed: false,
            pending: None,
            store,
            clock,
            config,
        })
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        self.subject.id()
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.selection.cursor
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingCommit> {
        self.pending.as_ref()
    }

    /// How long until the pending mark is due, if there is one.
    #[must_use]
    pub fn time_until_pending(&self) -> Option<std::time::Duration> {
        self.pending.map(|pending| self.clock.until(pending.due_at))
    }

    // ─── Derived state ──────────────────────────────────────────────────────

    /// Questions eligible for display under the current filters.
    #[must_use]
    pub fn working_set(&self) -> Vec<&Question> {
        let questions = self.subject.questions();
        derive_working_set(
            self.selection.order.iter().filter_map(|&idx| questions.get(idx)),
            &self.selection.category,
            self.selection.status,
            &self.progress,
        )
    }

    /// The card under the cursor, if the working set is non-empty.
    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.working_set().get(self.selection.cursor).copied()
    }

    #[must_use]
    pub fn current_card(&self) -> Option<CardView<'_>> {
        let set = self.working_set();
        let question = *set.get(self.selection.cursor)?;
        Some(CardView {
            question,
            face: question.face(self.revealed),
            status: self.progress.status_of(question.id()),
            position: self.selection.cursor + 1,
            total: set.len(),
        })
    }

    #[must_use]
    pub fn current_face(&self) -> Option<CardFace<'_>> {
        self.current().map(|q| q.face(self.revealed))
    }

    /// Why the working set is empty, or `None` when there is something to study.
    #[must_use]
    pub fn empty_state(&self) -> Option<EmptyState> {
        self.working_set()
            .is_empty()
            .then(|| self.selection.status.empty_state())
    }

    #[must_use]
    pub fn list_rows(&self) -> Vec<ListRow<'_>> {
        self.working_set()
            .into_iter()
            .map(|question| ListRow {
                question,
                status: self.progress.status_of(question.id()),
            })
            .collect()
    }

    /// Category choices in display order (excluding "All").
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.subject.categories()
    }

    /// Counts across the whole subject, independent of filters.
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        self.progress
            .counts(self.subject.questions().iter().map(Question::id))
    }

    /// Share of the subject marked as mastered, rounded to a whole percent.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let counts = self.counts();
        if counts.total == 0 {
            return 0;
        }
        let percent = (counts.learned * 200 + counts.total) / (counts.total * 2);
        u8::try_from(percent).unwrap_or(100)
    }

    #[must_use]
    pub fn status_of(&self, id: QuestionId) -> QuestionStatus {
        self.progress.status_of(id)
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    /// Flips the current card. Hiding the answer drops any pending mark.
    pub fn toggle_reveal(&mut self) -> bool {
        self.revealed = !self.revealed;
        if !self.revealed {
            self.cancel_pending();
        }
        self.revealed
    }

    pub fn reveal(&mut self) {
        self.revealed = true;
    }

    /// Moves to the next/previous card, wrapping at the ends.
    ///
    /// Returns `false` without touching state when the working set is empty.
    pub fn advance(&mut self, direction: Direction) -> bool {
        let len = self.working_set().len();
        if len == 0 {
            return false;
        }
        self.cancel_pending();
        self.selection.step(direction, len);
        self.revealed = false;
        true
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.selection.category = category;
        self.selection.view = ViewMode::Card;
        self.restart_at_first_card();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.selection.status = status;
        self.restart_at_first_card();
    }

    /// Back to "All" / "all".
    pub fn clear_filters(&mut self) {
        self.selection.category = CategoryFilter::All;
        self.selection.status = StatusFilter::All;
        self.restart_at_first_card();
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.selection.view = view;
    }

    /// Randomizes the study order. Filters are kept.
    pub fn shuffle(&mut self) {
        shuffle(&mut self.selection.order);
        self.restart_at_first_card();
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle_with(&mut self.selection.order, rng);
        self.restart_at_first_card();
    }

    fn restart_at_first_card(&mut self) {
        self.cancel_pending();
        self.selection.cursor = 0;
        self.revealed = false;
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(question = %pending.question_id, "pending mark cancelled");
        }
    }

    // ─── Marking ────────────────────────────────────────────────────────────

    /// Marks the current card as known.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn mark_known(&mut self) -> Result<MarkOutcome, SessionError> {
        self.mark_current(StatusKind::Mastered).await
    }

    /// Marks the current card as failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn mark_failed(&mut self) -> Result<MarkOutcome, SessionError> {
        self.mark_current(StatusKind::Failed).await
    }

    /// Marks the current card.
    ///
    /// On a hidden card the answer is revealed first and the mark is deferred
    /// by the configured reveal delay; see [`Self::tick`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails and
    /// `SessionError::Inactive` if this subject is no longer the active one.
    /// Progress and cursor are left untouched on error.
    pub async fn mark_current(&mut self, kind: StatusKind) -> Result<MarkOutcome, SessionError> {
        let Some(question_id) = self.current().map(Question::id) else {
            return Ok(MarkOutcome::NoCard);
        };

        if !self.revealed && self.config.defers_marks() {
            self.revealed = true;
            let due_at = self.clock.deadline_after(self.config.reveal_delay());
            self.pending = Some(PendingCommit {
                question_id,
                kind,
                due_at,
            });
            debug!(question = %question_id, %kind, "mark deferred until answer is seen");
            return Ok(MarkOutcome::Deferred {
                question_id,
                due_at,
            });
        }

        self.pending = None;
        self.commit(question_id, kind).await?;
        Ok(MarkOutcome::Committed(question_id))
    }

    /// Applies a finished swipe through the same path as the mark buttons,
    /// without the reveal pause.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn apply_swipe(&mut self, outcome: SwipeOutcome) -> Result<MarkOutcome, SessionError> {
        let SwipeOutcome::Commit(direction) = outcome else {
            return Ok(MarkOutcome::Cancelled);
        };
        let Some(question_id) = self.current().map(Question::id) else {
            return Ok(MarkOutcome::NoCard);
        };
        self.cancel_pending();
        self.commit(question_id, direction.status_kind()).await?;
        Ok(MarkOutcome::Committed(question_id))
    }

    /// Applies the pending mark if its delay has elapsed on the session clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn tick(&mut self) -> Result<Option<QuestionId>, SessionError> {
        let now = self.clock.now();
        self.tick_at(now).await
    }

    /// Applies the pending mark if it is due at `now`.
    ///
    /// The mark is dropped if its card is no longer the current one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<Option<QuestionId>, SessionError> {
        match self.pending {
            Some(pending) if pending.due_at <= now => self.apply_pending().await,
            _ => Ok(None),
        }
    }

    /// Applies the pending mark immediately, ignoring its deadline.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the progress write fails.
    pub async fn flush_pending(&mut self) -> Result<Option<QuestionId>, SessionError> {
        self.apply_pending().await
    }

    async fn apply_pending(&mut self) -> Result<Option<QuestionId>, SessionError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        if self.current().map(Question::id) != Some(pending.question_id) {
            debug!(question = %pending.question_id, "dropping stale pending mark");
            return Ok(None);
        }
        self.commit(pending.question_id, pending.kind).await?;
        Ok(Some(pending.question_id))
    }

    /// Moves `question_id` into `kind`, persists, and steps past the card.
    ///
    /// If the card is still in the working set afterwards the cursor moves one
    /// position forward; if it dropped out, the next card has already slid
    /// into the cursor slot. Nothing changes in memory unless the write
    /// succeeds.
    async fn commit(&mut self, question_id: QuestionId, kind: StatusKind) -> Result<(), SessionError> {
        let mut next = self.progress.clone();
        let change = next.mark(question_id, kind);
        self.persist(&next, change).await?;
        self.progress = next;
        self.revealed = false;

        let set = self.working_set();
        let len = set.len();
        let position = set.iter().position(|q| q.id() == question_id);
        match position {
            Some(pos) => self.selection.cursor = (pos + 1) % len,
            None => self.selection.clamp_cursor(len),
        }

        debug!(question = %question_id, %kind, cursor = self.selection.cursor, "mark committed");
        Ok(())
    }

    /// Rotates one question through unseen → failed → mastered → unseen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` for an id outside this subject
    /// and `SessionError::Storage` if the progress write fails.
    pub async fn cycle_status(&mut self, id: QuestionId) -> Result<QuestionStatus, SessionError> {
        if !self.subject.contains(id) {
            return Err(SessionError::UnknownQuestion(id));
        }
        let mut next = self.progress.clone();
        let (status, change) = next.cycle(id);
        self.persist(&next, change).await?;
        self.progress = next;
        let len = self.working_set().len();
        self.selection.clamp_cursor(len);
        Ok(status)
    }

    /// Writes `progress` for the sets touched by `change`.
    ///
    /// Fails with `SessionError::Inactive` when another subject has taken
    /// over the progress store since this session was opened.
    async fn persist(&self, progress: &Progress, change: ProgressChange) -> Result<(), SessionError> {
        if change.is_empty() {
            return Ok(());
        }
        let written = self
            .store
            .save_change(self.subject.id(), progress, change)
            .await?;
        if !written {
            warn!(subject = %self.subject.id(), "session is no longer active; mark not saved");
            return Err(SessionError::Inactive(self.subject.id().clone()));
        }
        Ok(())
    }

    // ─── Reset ──────────────────────────────────────────────────────────────

    /// First half of a progress reset; show a confirmation, then pass the
    /// request to [`Self::confirm_reset`].
    pub fn request_reset(&self) -> ResetRequest {
        ResetRequest {
            subject: self.subject.id().clone(),
        }
    }

    /// Clears both progress sets for this subject. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StaleReset` if the request belongs to another
    /// subject, `SessionError::Inactive` if another subject has taken over
    /// the progress store, and `SessionError::Storage` if the write fails.
    pub async fn confirm_reset(&mut self, request: ResetRequest) -> Result<(), SessionError> {
        if request.subject != *self.subject.id() {
            return Err(SessionError::StaleReset);
        }
        if !self.store.is_initialized(self.subject.id()) {
            return Err(SessionError::Inactive(self.subject.id().clone()));
        }
        self.store.reset_subject_progress(self.subject.id()).await?;
        self.cancel_pending();
        let _ = self.progress.clear();
        self.revealed = false;
        let len = self.working_set().len();
        self.selection.clamp_cursor(len);
        Ok(())
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("subject", self.subject.id())
            .field("selection", &self.selection)
            .field("mastered", &self.progress.mastered().len())
            .field("failed", &self.progress.failed().len())
            .field("revealed", &self.revealed)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
