use std::sync::Arc;

use kioku_core::model::SubjectId;
use storage::ProgressStore;
use storage::repository::Storage;
use tracing::{info, warn};

use crate::Clock;
use crate::catalog::Catalog;
use crate::error::{AppServicesError, SessionError};
use crate::sessions::{SessionConfig, StudySession};

/// Assembles the catalog and progress storage and hands out study sessions.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress: ProgressStore,
    clock: Clock,
    config: SessionConfig,
}

impl AppServices {
    #[must_use]
    pub fn new(catalog: Catalog, storage: &Storage, clock: Clock, config: SessionConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            progress: ProgressStore::new(Arc::clone(&storage.kv)),
            clock,
            config,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Catalog,
        clock: Clock,
        config: SessionConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(catalog, &storage, clock, config))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Starts studying `subject` and remembers it for the next launch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSubject` if the catalog has no such
    /// subject, or `SessionError::Storage` if progress cannot be loaded.
    pub async fn open_subject(&self, subject: &SubjectId) -> Result<StudySession, SessionError> {
        let Some(subject) = self.catalog.get(subject) else {
            return Err(SessionError::UnknownSubject(subject.clone()));
        };
        let session =
            StudySession::open(Arc::clone(&subject), self.progress.clone(), self.clock, self.config)
                .await?;
        self.progress.set_active_subject(Some(subject.id())).await?;
        info!(subject = %subject.id(), "subject selected");
        Ok(session)
    }

    /// Reopens the subject remembered from the previous launch, if it still
    /// exists in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if storage cannot be read.
    pub async fn restore_session(&self) -> Result<Option<StudySession>, SessionError> {
        let Some(remembered) = self.progress.remembered_subject().await? else {
            return Ok(None);
        };
        if !self.catalog.contains(&remembered) {
            warn!(subject = %remembered, "remembered subject is no longer available");
            return Ok(None);
        }
        self.open_subject(&remembered).await.map(Some)
    }

    /// Leaves `session` and returns to subject selection.
    ///
    /// Progress writes for the subject are blocked until it is opened again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the remembered subject cannot be
    /// cleared.
    pub async fn close_subject(&self, session: StudySession) -> Result<(), SessionError> {
        let subject = session.subject_id().clone();
        drop(session);
        self.progress.set_active_subject(None).await?;
        info!(%subject, "subject closed");
        Ok(())
    }
}
