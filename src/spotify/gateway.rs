use async_trait::async_trait;

use crate::{
    error::Result,
    types::{
        FullArtist, Page, PlaylistItem, PlaylistMeta, SavedTrack, SimplifiedPlaylist, User,
    },
};

/// Spotify operations used by sync and reconciliation.
///
/// Implementations own retry and backoff; callers see either the final result
/// or the error left after retries. `delete_playlist` is only called from
/// [`crate::playlists::safe_delete_playlist`].
#[async_trait]
pub trait SpotifyGateway: Send + Sync {
    async fn current_user(&self) -> Result<User>;

    /// Playlists followed or owned by the current user.
    async fn playlists_page(&self, offset: u32, limit: u32) -> Result<Page<SimplifiedPlaylist>>;

    /// Name, description and change marker of one playlist.
    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistMeta>;

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistItem>>;

    /// Saved tracks, most recently added first.
    async fn liked_songs_page(&self, offset: u32, limit: u32) -> Result<Page<SavedTrack>>;

    /// Full artist objects for at most 50 ids. Unknown ids are dropped.
    async fn artists(&self, ids: &[String]) -> Result<Vec<FullArtist>>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistMeta>;

    /// Appends at most 100 uris and returns the new change marker.
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<String>;

    async fn change_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()>;

    /// Removes the playlist from the user's library (unfollow).
    async fn delete_playlist(&self, playlist_id: &str) -> Result<()>;
}
