use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::Result,
    types::{
        ArtistRow, HistoryEvent, LIKED_SONGS_PLAYLIST_ID, MembershipRow, PlaylistRow, TrackRow,
    },
};

/// The five persisted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Playlists,
    Tracks,
    Artists,
    PlaylistTracks,
    StreamingHistory,
}

impl Table {
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Playlists => "playlists.json",
            Table::Tracks => "tracks.json",
            Table::Artists => "artists.json",
            Table::PlaylistTracks => "playlist_tracks.json",
            Table::StreamingHistory => "streaming_history.json",
        }
    }
}

/// Whole-table JSON persistence under one data directory.
///
/// Reads of a table that was never written return an empty table. Writes go
/// through [`write_atomic`], so a crash mid-write keeps the previous file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    pub async fn read_table<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>> {
        let path = self.path(table);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let content = async_fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn write_table<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rows)?;
        write_atomic(&self.path(table), &json).await
    }

    pub async fn load_library(&self) -> Result<Library> {
        Ok(Library {
            playlists: self.read_table(Table::Playlists).await?,
            tracks: self.read_table(Table::Tracks).await?,
            artists: self.read_table(Table::Artists).await?,
            memberships: self.read_table(Table::PlaylistTracks).await?,
        })
    }

    pub async fn save_library(&self, library: &Library) -> Result<()> {
        self.write_table(Table::Tracks, &library.tracks).await?;
        self.write_table(Table::Artists, &library.artists).await?;
        self.write_table(Table::PlaylistTracks, &library.memberships)
            .await?;
        self.write_table(Table::Playlists, &library.playlists).await
    }

    pub async fn load_history(&self) -> Result<Vec<HistoryEvent>> {
        let mut events: Vec<HistoryEvent> = self.read_table(Table::StreamingHistory).await?;
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    pub async fn save_history(&self, events: &[HistoryEvent]) -> Result<()> {
        self.write_table(Table::StreamingHistory, events).await
    }
}

/// In-memory view of the four library tables.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub playlists: Vec<PlaylistRow>,
    pub tracks: Vec<TrackRow>,
    pub artists: Vec<ArtistRow>,
    pub memberships: Vec<MembershipRow>,
}

impl Library {
    pub fn playlist(&self, playlist_id: &str) -> Option<&PlaylistRow> {
        self.playlists.iter().find(|p| p.id == playlist_id)
    }

    /// Memberships of one playlist in position order.
    pub fn playlist_tracks(&self, playlist_id: &str) -> Vec<&MembershipRow> {
        let mut rows: Vec<&MembershipRow> = self
            .memberships
            .iter()
            .filter(|m| m.playlist_id == playlist_id)
            .collect();
        rows.sort_by_key(|m| m.position);
        rows
    }

    /// Replaces every membership row of `playlist_id` with `rows`.
    pub fn replace_memberships(&mut self, playlist_id: &str, rows: Vec<MembershipRow>) {
        self.memberships.retain(|m| m.playlist_id != playlist_id);
        self.memberships.extend(rows);
    }

    pub fn remove_playlist(&mut self, playlist_id: &str) {
        self.playlists.retain(|p| p.id != playlist_id);
        self.memberships.retain(|m| m.playlist_id != playlist_id);
    }

    /// Liked-song additions as `(added_at, uri)`, oldest first, one entry
    /// per uri (its earliest addition).
    pub fn liked_additions(&self) -> Vec<(DateTime<Utc>, String)> {
        let mut first_seen: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for row in self
            .memberships
            .iter()
            .filter(|m| m.playlist_id == LIKED_SONGS_PLAYLIST_ID)
        {
            let Some(added_at) = row.added_at else {
                continue;
            };
            first_seen
                .entry(row.track_uri.as_str())
                .and_modify(|t| *t = (*t).min(added_at))
                .or_insert(added_at);
        }

        let mut additions: Vec<(DateTime<Utc>, String)> = first_seen
            .into_iter()
            .map(|(uri, at)| (at, uri.to_string()))
            .collect();
        additions.sort();
        additions
    }

    pub fn track_index(&self) -> BTreeMap<&str, &TrackRow> {
        self.tracks.iter().map(|t| (t.id.as_str(), t)).collect()
    }

    pub fn artist_index(&self) -> BTreeMap<&str, &ArtistRow> {
        self.artists.iter().map(|a| (a.id.as_str(), a)).collect()
    }
}

/// Writes `bytes` to a sibling temp file and renames it over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    async_fs::write(&tmp, bytes).await?;
    async_fs::rename(&tmp, path).await?;
    Ok(())
}
