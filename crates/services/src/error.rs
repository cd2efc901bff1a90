//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use kioku_core::model::{QuestionId, SubjectError, SubjectId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the question catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode dataset {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid subject {subject}: {source}")]
    Subject {
        subject: SubjectId,
        #[source]
        source: SubjectError,
    },
    #[error("duplicate subject id {0}")]
    DuplicateSubject(SubjectId),
}

/// Errors emitted by study sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown subject {0}")]
    UnknownSubject(SubjectId),
    #[error("question {0} does not belong to this subject")]
    UnknownQuestion(QuestionId),
    #[error("reset request was issued for another subject")]
    StaleReset,
    #[error("subject {0} is no longer active; progress was not saved")]
    Inactive(SubjectId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
