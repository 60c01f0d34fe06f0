use std::{collections::HashSet, path::PathBuf};

use chrono::Utc;

use crate::{
    error::{Error, Result},
    management::{BackupStore, PlaylistBackup, PlaylistTrackCache},
    spotify::{SpotifyGateway, paging},
    types::LIKED_SONGS_PLAYLIST_ID,
    verbose, warning,
};

/// Result of a guarded deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionOutcome {
    pub deleted: bool,
    pub backup: Option<PathBuf>,
    /// Tracks of the target that were not found in the successor.
    pub missing: Vec<String>,
}

/// Deletes a playlist only once its content is known to be safe.
///
/// 1. Fetches the target's current tracks from the API.
/// 2. Writes a backup first when `create_backup` is set.
/// 3. When `verify_tracks_preserved_in` is given, re-fetches that playlist
///    (never from cache) and refuses to delete if any target track is absent.
///    The backup, if written, is kept either way.
/// 4. Deletes the playlist.
///
/// This is the only code path that deletes playlists. A refused deletion is
/// not an error: it comes back with `deleted == false` and the missing uris.
pub async fn safe_delete_playlist(
    gateway: &dyn SpotifyGateway,
    backups: &BackupStore,
    cache: &mut PlaylistTrackCache,
    playlist_id: &str,
    name: &str,
    create_backup: bool,
    verify_tracks_preserved_in: Option<&str>,
) -> Result<DeletionOutcome> {
    if playlist_id == LIKED_SONGS_PLAYLIST_ID {
        return Err(Error::Integrity(
            "the liked songs collection can never be deleted".to_string(),
        ));
    }
    if verify_tracks_preserved_in == Some(playlist_id) {
        return Err(Error::Integrity(format!(
            "'{name}' cannot be verified against itself"
        )));
    }

    let tracks = paging::fetch_playlist_track_uris(gateway, playlist_id).await?;

    let mut outcome = DeletionOutcome::default();
    if create_backup {
        let backup = PlaylistBackup {
            playlist_id: playlist_id.to_string(),
            name: name.to_string(),
            tracks: tracks.clone(),
            created_at: Utc::now(),
        };
        let path = backups.write(&backup).await?;
        verbose!("Backed up '{}' to {}", name, path.display());
        outcome.backup = Some(path);
    }

    if let Some(successor_id) = verify_tracks_preserved_in {
        cache.invalidate(successor_id);
        let successor: HashSet<String> = paging::fetch_playlist_track_uris(gateway, successor_id)
            .await?
            .into_iter()
            .collect();

        let mut reported = HashSet::new();
        outcome.missing = tracks
            .iter()
            .filter(|uri| !successor.contains(*uri) && reported.insert(uri.as_str()))
            .cloned()
            .collect();

        if !outcome.missing.is_empty() {
            warning!(
                "Keeping '{}': {} track(s) not found in its successor",
                name,
                outcome.missing.len()
            );
            return Ok(outcome);
        }
    }

    gateway.delete_playlist(playlist_id).await?;
    cache.invalidate(playlist_id);
    outcome.deleted = true;
    Ok(outcome)
}
