#![forbid(unsafe_code)]

pub mod progress_store;
pub mod repository;
pub mod sqlite;

pub use progress_store::{ProgressStore, SELECTED_SUBJECT_KEY, progress_key};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
