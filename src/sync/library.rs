use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use crate::{
    error::{Error, Result},
    management::{ChangeMarkerCache, Library, SnapshotStore},
    spotify::{SpotifyGateway, paging},
    types::{
        ArtistRow, LIKED_SONGS_PLAYLIST_ID, LIKED_SONGS_PLAYLIST_NAME, MembershipRow, PlaylistRow,
        SimplifiedPlaylist, Track, TrackRow,
    },
    utils, verbose, warning,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub playlists_updated: usize,
    pub playlists_skipped: usize,
    pub playlists_failed: usize,
    pub playlists_removed: usize,
    pub tracks_added: usize,
    pub total_tracks: usize,
    pub total_artists: usize,
    pub total_playlists: usize,
}

/// Incremental sync of playlists, memberships, tracks and artists.
///
/// A playlist whose live `snapshot_id` equals the cached marker keeps its
/// stored memberships; every other playlist has its memberships replaced
/// wholesale. The live marker is recorded for every processed playlist, even
/// when its membership fetch fails; a failed playlist keeps its previous rows.
pub struct LibrarySync {
    gateway: Arc<dyn SpotifyGateway>,
    store: SnapshotStore,
    markers: ChangeMarkerCache,
}

impl LibrarySync {
    pub fn new(gateway: Arc<dyn SpotifyGateway>, store: SnapshotStore, markers: ChangeMarkerCache) -> Self {
        Self {
            gateway,
            store,
            markers,
        }
    }

    pub fn markers(&self) -> &ChangeMarkerCache {
        &self.markers
    }

    pub async fn sync(
        &mut self,
        force: bool,
        owned_only: bool,
        include_liked_songs: bool,
    ) -> Result<SyncStats> {
        let mut stats = SyncStats::default();
        let pb = utils::spinner("Fetching playlists...");

        let user = self.gateway.current_user().await?;
        let listing: Vec<SimplifiedPlaylist> = paging::fetch_all_playlists(self.gateway.as_ref())
            .await?
            .into_iter()
            .filter(|p| !owned_only || p.owner.id == user.id)
            .collect();

        let mut library = self.store.load_library().await?;
        let known: HashSet<String> = library.playlists.iter().map(|p| p.id.clone()).collect();
        let mut tracks: BTreeMap<String, TrackRow> = library
            .tracks
            .drain(..)
            .map(|t| (t.id.clone(), t))
            .collect();
        let mut observed_artists: BTreeSet<String> = BTreeSet::new();
        let mut rows: Vec<PlaylistRow> = Vec::with_capacity(listing.len() + 1);

        let listed: HashSet<&str> = listing.iter().map(|p| p.id.as_str()).collect();
        let vanished: Vec<String> = known
            .iter()
            .filter(|id| id.as_str() != LIKED_SONGS_PLAYLIST_ID && !listed.contains(id.as_str()))
            .cloned()
            .collect();
        for id in vanished {
            verbose!("Playlist {} is gone, dropping its rows", id);
            library.remove_playlist(&id);
            self.markers.invalidate(&id);
            stats.playlists_removed += 1;
        }

        let total = listing.len();
        for (index, playlist) in listing.iter().enumerate() {
            pb.set_message(format!("[{}/{}] {}", index + 1, total, playlist.name));
            let row = PlaylistRow {
                id: playlist.id.clone(),
                name: playlist.name.clone(),
                description: playlist.description.clone(),
                owner_id: playlist.owner.id.clone(),
                snapshot_id: playlist.snapshot_id.clone(),
                track_count: playlist.tracks.total,
                is_owned: playlist.owner.id == user.id,
            };

            if !force
                && known.contains(&playlist.id)
                && self.markers.is_unchanged(&playlist.id, &playlist.snapshot_id)
            {
                stats.playlists_skipped += 1;
                rows.push(row);
                continue;
            }

            match paging::fetch_playlist_items(self.gateway.as_ref(), &playlist.id).await {
                Ok(items) => {
                    let memberships = items
                        .into_iter()
                        .enumerate()
                        .filter_map(|(position, item)| {
                            membership(
                                &playlist.id,
                                position as u32,
                                item.added_at,
                                item.track.as_ref()?,
                                &mut tracks,
                                &mut observed_artists,
                                &mut stats.tracks_added,
                            )
                        })
                        .collect();
                    library.replace_memberships(&playlist.id, memberships);
                    self.markers.set(&playlist.id, &playlist.snapshot_id);
                    stats.playlists_updated += 1;
                    rows.push(row);
                }
                Err(Error::NotFound(_)) => {
                    warning!("'{}' was deleted remotely, removing it", playlist.name);
                    library.remove_playlist(&playlist.id);
                    self.markers.invalidate(&playlist.id);
                    stats.playlists_removed += 1;
                }
                Err(e) => {
                    warning!("Failed to sync '{}': {}", playlist.name, e);
                    stats.playlists_failed += 1;
                    self.markers.set(&playlist.id, &playlist.snapshot_id);
                    if let Some(previous) = library.playlist(&playlist.id) {
                        rows.push(previous.clone());
                    }
                }
            }
        }

        let previous_liked = library.playlist(LIKED_SONGS_PLAYLIST_ID).cloned();
        if include_liked_songs {
            pb.set_message("Fetching liked songs...");
            match self
                .sync_liked_songs(&user.id, force, &mut library, &mut tracks, &mut observed_artists, &mut stats)
                .await
            {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warning!("Failed to sync liked songs: {}", e);
                    stats.playlists_failed += 1;
                    rows.extend(previous_liked);
                }
            }
        } else {
            rows.extend(previous_liked);
        }

        pb.set_message(format!("Fetching {} artists...", observed_artists.len()));
        let artists = self
            .refresh_artists(&mut library.artists, &observed_artists)
            .await;
        if let Err(e) = artists {
            warning!("Failed to refresh artists: {}", e);
        }

        library.playlists = rows;
        library.tracks = tracks.into_values().collect();

        stats.total_playlists = library.playlists.len();
        stats.total_tracks = library.tracks.len();
        stats.total_artists = library.artists.len();

        self.store.save_library(&library).await?;
        self.markers.persist().await?;
        pb.finish_and_clear();

        Ok(stats)
    }

    /// Liked songs have no `snapshot_id`; their marker is the total count
    /// plus the newest addition time.
    async fn sync_liked_songs(
        &mut self,
        user_id: &str,
        force: bool,
        library: &mut Library,
        tracks: &mut BTreeMap<String, TrackRow>,
        observed_artists: &mut BTreeSet<String>,
        stats: &mut SyncStats,
    ) -> Result<PlaylistRow> {
        let head = self.gateway.liked_songs_page(0, 1).await?;
        let newest = head
            .items
            .first()
            .map(|s| s.added_at.to_rfc3339())
            .unwrap_or_default();
        let marker = format!("{}:{}", head.total, newest);

        let mut row = PlaylistRow {
            id: LIKED_SONGS_PLAYLIST_ID.to_string(),
            name: LIKED_SONGS_PLAYLIST_NAME.to_string(),
            description: None,
            owner_id: user_id.to_string(),
            snapshot_id: marker.clone(),
            track_count: head.total,
            is_owned: true,
        };

        if !force
            && library.playlist(LIKED_SONGS_PLAYLIST_ID).is_some()
            && self.markers.is_unchanged(LIKED_SONGS_PLAYLIST_ID, &marker)
        {
            stats.playlists_skipped += 1;
            return Ok(row);
        }

        let saved = paging::fetch_liked_songs(self.gateway.as_ref()).await?;
        row.track_count = saved.len() as u64;
        let memberships = saved
            .into_iter()
            .enumerate()
            .filter_map(|(position, s)| {
                membership(
                    LIKED_SONGS_PLAYLIST_ID,
                    position as u32,
                    Some(s.added_at),
                    &s.track,
                    tracks,
                    observed_artists,
                    &mut stats.tracks_added,
                )
            })
            .collect();
        library.replace_memberships(LIKED_SONGS_PLAYLIST_ID, memberships);
        self.markers.set(LIKED_SONGS_PLAYLIST_ID, marker);
        stats.playlists_updated += 1;
        Ok(row)
    }

    /// Overwrites the rows of every observed artist with fresh data.
    async fn refresh_artists(
        &self,
        artists: &mut Vec<ArtistRow>,
        observed: &BTreeSet<String>,
    ) -> Result<()> {
        let ids: Vec<String> = observed.iter().cloned().collect();
        let mut by_id: BTreeMap<String, ArtistRow> =
            artists.drain(..).map(|a| (a.id.clone(), a)).collect();

        let mut result = Ok(());
        for chunk in ids.chunks(paging::ARTISTS_BATCH) {
            match self.gateway.artists(chunk).await {
                Ok(fetched) => {
                    for artist in fetched {
                        by_id.insert(artist.id.clone(), ArtistRow::from(artist));
                    }
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        *artists = by_id.into_values().collect();
        result
    }
}

/// Builds the membership row for `track` and upserts its track row.
/// Local files (no id) are not part of the snapshot.
fn membership(
    playlist_id: &str,
    position: u32,
    added_at: Option<chrono::DateTime<chrono::Utc>>,
    track: &Track,
    tracks: &mut BTreeMap<String, TrackRow>,
    observed_artists: &mut BTreeSet<String>,
    tracks_added: &mut usize,
) -> Option<MembershipRow> {
    let row = track.to_row()?;
    observed_artists.extend(row.artist_ids.iter().cloned());
    if tracks.insert(row.id.clone(), row.clone()).is_none() {
        *tracks_added += 1;
    }
    Some(MembershipRow {
        playlist_id: playlist_id.to_string(),
        track_id: row.id,
        track_uri: row.uri,
        position,
        added_at,
    })
}
