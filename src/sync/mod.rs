//! Bringing remote state into the snapshot store.

pub mod history;
pub mod library;

pub use history::{ImportStats, import_streaming_history};
pub use library::{LibrarySync, SyncStats};
