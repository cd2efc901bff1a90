#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod sessions;

pub use kioku_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use catalog::Catalog;
pub use error::{AppServicesError, CatalogError, SessionError};

pub use sessions::{
    CardView, Direction, ListRow, MarkOutcome, PendingCommit, ResetRequest, Selection, SessionConfig,
    StudySession, ViewMode,
};
