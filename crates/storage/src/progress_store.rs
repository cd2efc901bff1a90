//! Persisted study progress on top of a [`KeyValueStore`].
//!
//! Layout:
//! - `kioku-selected-subject` holds the subject restored on next launch.
//! - `kioku-<subject>-mastered-ids` / `kioku-<subject>-failed-ids` hold JSON
//!   arrays of question ids.
//!
//! Values that fail to decode are logged and treated as absent.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use kioku_core::model::{Progress, ProgressChange, QuestionId, StatusKind, SubjectId};
use tracing::{debug, info, warn};

use crate::repository::{KeyValueStore, StorageError};

pub const SELECTED_SUBJECT_KEY: &str = "kioku-selected-subject";

/// Storage key for one of a subject's progress sets.
#[must_use]
pub fn progress_key(subject: &SubjectId, kind: StatusKind) -> String {
    format!("kioku-{subject}-{kind}-ids")
}

/// Loads and saves per-subject progress.
///
/// Writes for a subject are ignored until that subject has been loaded, so a
/// half-switched session can never overwrite stored progress with empty sets.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    initialized: Arc<Mutex<Option<SubjectId>>>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            initialized: Arc::new(Mutex::new(None)),
        }
    }

    /// Reads both sets for `subject` and marks the store initialized for it.
    ///
    /// Missing or undecodable values load as empty sets.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend itself cannot be read.
    pub async fn load(&self, subject: &SubjectId) -> Result<Progress, StorageError> {
        let mastered = self.load_ids(subject, StatusKind::Mastered).await?;
        let failed = self.load_ids(subject, StatusKind::Failed).await?;
        *self.lock_initialized() = Some(subject.clone());
        debug!(
            %subject,
            mastered = mastered.len(),
            failed = failed.len(),
            "loaded progress"
        );
        Ok(Progress::from_sets(mastered, failed))
    }

    async fn load_ids(
        &self,
        subject: &SubjectId,
        kind: StatusKind,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let key = progress_key(subject, kind);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<QuestionId>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(err) => {
                warn!(%key, error = %err, "failed to decode saved progress; using empty set");
                Ok(Vec::new())
            }
        }
    }

    /// Returns true once `load` has run for `subject` and it is still active.
    #[must_use]
    pub fn is_initialized(&self, subject: &SubjectId) -> bool {
        self.lock_initialized().as_ref() == Some(subject)
    }

    /// Writes one set for `subject`.
    ///
    /// Returns `Ok(false)` without writing if the store is not initialized for
    /// `subject`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub async fn save(
        &self,
        subject: &SubjectId,
        kind: StatusKind,
        ids: &BTreeSet<QuestionId>,
    ) -> Result<bool, StorageError> {
        if !self.is_initialized(subject) {
            debug!(%subject, %kind, "progress store not initialized for subject; skipping save");
            return Ok(false);
        }
        self.write_ids(subject, kind, ids).await?;
        Ok(true)
    }

    /// Writes every set touched by `change`.
    ///
    /// Returns `Ok(false)` without writing anything if the store is not
    /// initialized for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a write fails.
    pub async fn save_change(
        &self,
        subject: &SubjectId,
        progress: &Progress,
        change: ProgressChange,
    ) -> Result<bool, StorageError> {
        if !self.is_initialized(subject) {
            debug!(%subject, "progress store not initialized for subject; skipping save");
            return Ok(false);
        }
        for kind in StatusKind::ALL {
            if change.touches(kind) {
                self.write_ids(subject, kind, progress.ids(kind)).await?;
            }
        }
        Ok(true)
    }

    async fn write_ids(
        &self,
        subject: &SubjectId,
        kind: StatusKind,
        ids: &BTreeSet<QuestionId>,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&ids.iter().collect::<Vec<_>>())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(&progress_key(subject, kind), &encoded).await
    }

    /// Empties both sets for `subject` in storage.
    ///
    /// Callers are expected to have confirmed the reset with the learner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a write fails.
    pub async fn reset_subject_progress(&self, subject: &SubjectId) -> Result<(), StorageError> {
        let empty = BTreeSet::new();
        for kind in StatusKind::ALL {
            self.write_ids(subject, kind, &empty).await?;
        }
        info!(%subject, "progress reset");
        Ok(())
    }

    /// Subject remembered from the previous launch, if any.
    ///
    /// An invalid stored value is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn remembered_subject(&self) -> Result<Option<SubjectId>, StorageError> {
        let Some(raw) = self.kv.get(SELECTED_SUBJECT_KEY).await? else {
            return Ok(None);
        };
        match raw.parse::<SubjectId>() {
            Ok(subject) => Ok(Some(subject)),
            Err(err) => {
                warn!(value = %raw, error = %err, "ignoring invalid remembered subject");
                Ok(None)
            }
        }
    }

    /// Records `subject` for the next launch; `None` forgets it.
    ///
    /// Forgetting also drops the initialized marker, so writes are blocked
    /// until the next `load`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    pub async fn set_active_subject(&self, subject: Option<&SubjectId>) -> Result<(), StorageError> {
        match subject {
            Some(subject) => self.kv.set(SELECTED_SUBJECT_KEY, subject.as_str()).await,
            None => {
                *self.lock_initialized() = None;
                self.kv.remove(SELECTED_SUBJECT_KEY).await
            }
        }
    }

    fn lock_initialized(&self) -> std::sync::MutexGuard<'_, Option<SubjectId>> {
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;

    fn subject(id: &str) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    fn ids(values: &[u64]) -> BTreeSet<QuestionId> {
        values.iter().copied().map(QuestionId::new).collect()
    }

    fn store() -> (InMemoryStore, ProgressStore) {
        let kv = InMemoryStore::new();
        let progress = ProgressStore::new(Arc::new(kv.clone()));
        (kv, progress)
    }

    #[test]
    fn keys_follow_storage_layout() {
        let history = subject("history");
        assert_eq!(
            progress_key(&history, StatusKind::Mastered),
            "kioku-history-mastered-ids"
        );
        assert_eq!(
            progress_key(&history, StatusKind::Failed),
            "kioku-history-failed-ids"
        );
    }

    #[tokio::test]
    async fn missing_keys_load_empty() {
        let (_, store) = store();
        let progress = store.load(&subject("history")).await.unwrap();
        assert!(progress.mastered().is_empty());
        assert!(progress.failed().is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_loads_empty() {
        let (kv, store) = store();
        kv.set("kioku-history-mastered-ids", "{not json").await.unwrap();
        kv.set("kioku-history-failed-ids", "[3]").await.unwrap();

        let progress = store.load(&subject("history")).await.unwrap();
        assert!(progress.mastered().is_empty());
        assert_eq!(progress.failed(), &ids(&[3]));
    }

    #[tokio::test]
    async fn save_is_skipped_until_loaded() {
        let (kv, store) = store();
        let history = subject("history");

        let written = store
            .save(&history, StatusKind::Mastered, &ids(&[1]))
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(kv.get("kioku-history-mastered-ids").await.unwrap(), None);

        store.load(&history).await.unwrap();
        let written = store
            .save(&history, StatusKind::Mastered, &ids(&[1]))
            .await
            .unwrap();
        assert!(written);
        assert_eq!(
            kv.get("kioku-history-mastered-ids").await.unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[tokio::test]
    async fn save_for_other_subject_is_skipped() {
        let (kv, store) = store();
        store.load(&subject("history")).await.unwrap();
        let written = store
            .save(&subject("ethics"), StatusKind::Failed, &ids(&[2]))
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(kv.get("kioku-ethics-failed-ids").await.unwrap(), None);
    }

    #[tokio::test]
    async fn round_trip_ignores_insertion_order() {
        let (_, store) = store();
        let history = subject("history");
        store.load(&history).await.unwrap();

        let mut progress = Progress::new();
        for id in [9, 2, 5] {
            let _ = progress.mark(QuestionId::new(id), StatusKind::Mastered);
        }
        store
            .save(&history, StatusKind::Mastered, progress.mastered())
            .await
            .unwrap();

        let reloaded = store.load(&history).await.unwrap();
        assert_eq!(reloaded.mastered(), &ids(&[2, 5, 9]));
    }

    #[tokio::test]
    async fn save_change_writes_only_touched_sets() {
        let (kv, store) = store();
        let history = subject("history");
        store.load(&history).await.unwrap();

        let mut progress = Progress::new();
        let change = progress.mark(QuestionId::new(4), StatusKind::Failed);
        assert!(store.save_change(&history, &progress, change).await.unwrap());

        assert_eq!(
            kv.get("kioku-history-failed-ids").await.unwrap().as_deref(),
            Some("[4]")
        );
        assert_eq!(kv.get("kioku-history-mastered-ids").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_change_reports_skipped_write() {
        let (kv, store) = store();
        store.load(&subject("ethics")).await.unwrap();

        let mut progress = Progress::new();
        let change = progress.mark(QuestionId::new(4), StatusKind::Mastered);
        let written = store
            .save_change(&subject("history"), &progress, change)
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(kv.get("kioku-history-mastered-ids").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remembered_subject_round_trip_and_forget() {
        let (kv, store) = store();
        let ethics = subject("ethics");
        assert_eq!(store.remembered_subject().await.unwrap(), None);

        store.set_active_subject(Some(&ethics)).await.unwrap();
        assert_eq!(
            kv.get(SELECTED_SUBJECT_KEY).await.unwrap().as_deref(),
            Some("ethics")
        );
        assert_eq!(store.remembered_subject().await.unwrap(), Some(ethics.clone()));

        store.load(&ethics).await.unwrap();
        store.set_active_subject(None).await.unwrap();
        assert_eq!(store.remembered_subject().await.unwrap(), None);
        assert!(!store.is_initialized(&ethics));
    }

    #[tokio::test]
    async fn invalid_remembered_subject_is_ignored() {
        let (kv, store) = store();
        kv.set(SELECTED_SUBJECT_KEY, "not a subject!").await.unwrap();
        assert_eq!(store.remembered_subject().await.unwrap(), None);
    }

    #[tokio::test]
    async fn reset_clears_both_sets() {
        let (kv, store) = store();
        let history = subject("history");
        kv.set("kioku-history-mastered-ids", "[1,2]").await.unwrap();
        kv.set("kioku-history-failed-ids", "[3]").await.unwrap();
        kv.set("kioku-ethics-failed-ids", "[7]").await.unwrap();

        store.reset_subject_progress(&history).await.unwrap();

        let progress = store.load(&history).await.unwrap();
        assert!(progress.mastered().is_empty());
        assert!(progress.failed().is_empty());
        assert_eq!(
            kv.get("kioku-ethics-failed-ids").await.unwrap().as_deref(),
            Some("[7]")
        );
    }
}
