use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::Result, management::store::write_atomic};

/// Everything needed to recreate a deleted playlist by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistBackup {
    pub playlist_id: String,
    pub name: String,
    pub tracks: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Directory of playlist backups, one JSON file per deletion event.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backups live in `.backups/` below the data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(".backups"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `backup` under a file name not used by any earlier backup.
    pub async fn write(&self, backup: &PlaylistBackup) -> Result<PathBuf> {
        async_fs::create_dir_all(&self.dir).await?;

        let stem = format!(
            "{}_{}_{}",
            file_safe(&backup.name),
            file_safe(&backup.playlist_id),
            backup.created_at.format("%Y%m%dT%H%M%S%.3f")
        );
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut counter = 1;
        while async_fs::metadata(&path).await.is_ok() {
            path = self.dir.join(format!("{stem}_{counter}.json"));
            counter += 1;
        }

        let json = serde_json::to_vec_pretty(backup)?;
        write_atomic(&path, &json).await?;
        Ok(path)
    }

    pub async fn read(path: &Path) -> Result<PlaylistBackup> {
        let content = async_fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All readable backups, oldest first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<(PathBuf, PlaylistBackup)>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(backup) = Self::read(&path).await {
                backups.push((path, backup));
            }
        }
        backups.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.0.cmp(&b.0)));
        Ok(backups)
    }
}

fn file_safe(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .take(60)
        .collect();
    if cleaned.is_empty() {
        "playlist".to_string()
    } else {
        cleaned
    }
}
