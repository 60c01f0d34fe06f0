//! Local persistence: snapshot tables, change-marker caches, the run-scoped
//! playlist track cache, deletion backups and the OAuth token.

mod auth;
mod backup;
mod cache;
mod marker;
mod store;

pub use auth::{TokenManager, refresh_token, token_from_json};
pub use backup::{BackupStore, PlaylistBackup};
pub use cache::PlaylistTrackCache;
pub use marker::{ChangeMarkerCache, DESCRIPTION_MARKER_CACHE, SYNC_MARKER_CACHE};
pub use store::{Library, SnapshotStore, Table, write_atomic};
