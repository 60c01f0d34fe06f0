use std::{collections::BTreeMap, path::PathBuf};

use crate::{error::Result, management::store::write_atomic, warning};

/// File backing the marker cache of the library sync.
pub const SYNC_MARKER_CACHE: &str = ".sync_marker_cache.json";
/// File backing the marker cache of the description synchronizer.
pub const DESCRIPTION_MARKER_CACHE: &str = ".description_marker_cache.json";

/// Persistent mapping of playlist id to the last processed change marker
/// (Spotify `snapshot_id`).
///
/// A missing or unreadable file loads as an empty cache, which makes every
/// playlist look changed.
#[derive(Debug, Clone)]
pub struct ChangeMarkerCache {
    path: PathBuf,
    markers: BTreeMap<String, String>,
}

impl ChangeMarkerCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            markers: BTreeMap::new(),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => return Self::new(path),
        };

        match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(markers) => Self { path, markers },
            Err(e) => {
                warning!(
                    "Ignoring unreadable marker cache {}: {}",
                    path.display(),
                    e
                );
                Self::new(path)
            }
        }
    }

    pub fn get(&self, playlist_id: &str) -> Option<&str> {
        self.markers.get(playlist_id).map(String::as_str)
    }

    pub fn set(&mut self, playlist_id: impl Into<String>, marker: impl Into<String>) {
        self.markers.insert(playlist_id.into(), marker.into());
    }

    pub fn invalidate(&mut self, playlist_id: &str) {
        self.markers.remove(playlist_id);
    }

    /// True when the cached marker equals `live_marker`.
    pub fn is_unchanged(&self, playlist_id: &str, live_marker: &str) -> bool {
        self.get(playlist_id) == Some(live_marker)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub async fn persist(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.markers)?;
        write_atomic(&self.path, &json).await
    }
}
