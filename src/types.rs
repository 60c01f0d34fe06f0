use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Fixed id of the pseudo-playlist holding the user's liked songs.
///
/// It exists only in the snapshot store; no remote operation may rename or
/// delete it.
pub const LIKED_SONGS_PLAYLIST_ID: &str = "__liked_songs__";

pub const LIKED_SONGS_PLAYLIST_NAME: &str = "Liked Songs";

/// OAuth token as persisted in the local token cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// PKCE verifier shared between the auth flow and the callback handler.
#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

// -- Spotify wire types ------------------------------------------------------

/// Offset based page as returned by every paginated Spotify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracksRef {
    #[serde(default)]
    pub total: u64,
}

/// Playlist as listed by `GET /me/playlists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: PlaylistOwner,
    pub snapshot_id: String,
    #[serde(default, alias = "items")]
    pub tracks: TracksRef,
}

/// Playlist metadata as returned by `GET /playlists/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub snapshot_id: String,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Track object. Local files come without an id and are never synced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub album: Option<SimplifiedAlbum>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

impl Track {
    /// Converts the wire track into a snapshot row, `None` for local files.
    pub fn to_row(&self) -> Option<TrackRow> {
        let id = self.id.clone()?;
        let release_year = self
            .album
            .as_ref()
            .and_then(|a| a.release_date.as_deref())
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());

        Some(TrackRow {
            id,
            name: self.name.clone(),
            uri: self.uri.clone(),
            duration_ms: self.duration_ms,
            explicit: self.explicit,
            album_id: self.album.as_ref().and_then(|a| a.id.clone()),
            album_name: self.album.as_ref().map(|a| a.name.clone()),
            artist_ids: self.artists.iter().filter_map(|a| a.id.clone()).collect(),
            popularity: self.popularity,
            release_year,
        })
    }
}

/// Entry of `GET /playlists/{id}/tracks`. `track` is null for removed or
/// unavailable items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub track: Option<Track>,
}

/// Entry of `GET /me/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    pub added_at: DateTime<Utc>,
    pub track: Track,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<FullArtist>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeDetailsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// -- Snapshot rows -----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    pub explicit: bool,
    pub album_id: Option<String>,
    pub album_name: Option<String>,
    pub artist_ids: Vec<String>,
    pub popularity: Option<u32>,
    pub release_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRow {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

impl From<FullArtist> for ArtistRow {
    fn from(artist: FullArtist) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub snapshot_id: String,
    pub track_count: u64,
    pub is_owned: bool,
}

/// One (playlist, track, position) membership. The same track may appear at
/// several positions of one playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub playlist_id: String,
    pub track_id: String,
    pub track_uri: String,
    pub position: u32,
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub track_uri: String,
    pub timestamp: DateTime<Utc>,
    pub ms_played: u64,
}

/// Record of a Spotify "Extended Streaming History" export file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedHistoryRecord {
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub ms_played: u64,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
}

// -- Report rows -------------------------------------------------------------

#[derive(Tabled)]
pub struct HealthTableRow {
    pub playlist: String,
    pub tracks: u64,
    pub score: i32,
    pub issues: String,
}

#[derive(Tabled)]
pub struct CountTableRow {
    pub name: String,
    pub count: u64,
}

#[derive(Tabled)]
pub struct BackupTableRow {
    pub file: String,
    pub playlist: String,
    pub tracks: usize,
    pub created: String,
}
