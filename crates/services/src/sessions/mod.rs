mod config;
mod selection;
mod service;
mod shuffle;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use config::{DEFAULT_REVEAL_DELAY, SessionConfig};
pub use selection::{Direction, Selection, ViewMode};
pub use service::{MarkOutcome, PendingCommit, ResetRequest, StudySession};
pub use shuffle::{shuffle, shuffle_with};
pub use view::{CardView, ListRow};
