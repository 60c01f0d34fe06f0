use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::{
    error::{Error, Result},
    management::SnapshotStore,
    types::{ExtendedHistoryRecord, HistoryEvent},
    verbose, warning,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportStats {
    pub files: usize,
    pub records: usize,
    pub imported: usize,
    pub duplicates: usize,
    /// Podcast episodes and other records without a track uri.
    pub without_track: usize,
}

/// Appends the plays of a Spotify "Extended Streaming History" export to the
/// history table.
///
/// Every `*.json` file in `dir` is read; files that are not extended history
/// exports are skipped with a warning. Events already stored (same uri and
/// timestamp) are not added again.
pub async fn import_streaming_history(store: &SnapshotStore, dir: &Path) -> Result<ImportStats> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();

    let mut events = store.load_history().await?;
    let mut seen: HashSet<(String, DateTime<Utc>)> = events
        .iter()
        .map(|e| (e.track_uri.clone(), e.timestamp))
        .collect();

    let mut stats = ImportStats::default();
    for path in files {
        let content = async_fs::read_to_string(&path).await?;
        let records: Vec<ExtendedHistoryRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warning!("Skipping {}: not an extended history export ({})", path.display(), e);
                continue;
            }
        };
        stats.files += 1;
        verbose!("{}: {} records", path.display(), records.len());

        for record in records {
            stats.records += 1;
            let Some(uri) = record.spotify_track_uri.filter(|u| !u.is_empty()) else {
                stats.without_track += 1;
                continue;
            };
            if !seen.insert((uri.clone(), record.ts)) {
                stats.duplicates += 1;
                continue;
            }
            events.push(HistoryEvent {
                track_uri: uri,
                timestamp: record.ts,
                ms_played: record.ms_played,
            });
            stats.imported += 1;
        }
    }

    events.sort_by_key(|e| e.timestamp);
    store.save_history(&events).await?;
    Ok(stats)
}
