use crate::{
    error::Result,
    spotify::SpotifyGateway,
    types::{PlaylistItem, SavedTrack, SimplifiedPlaylist},
};

/// Page size for playlist listings and saved tracks.
pub const PAGE_LIMIT: u32 = 50;
/// Page size for playlist items.
pub const ITEMS_PAGE_LIMIT: u32 = 100;
/// Maximum uris per add-tracks request.
pub const ADD_TRACKS_BATCH: usize = 100;
/// Maximum ids per several-artists request.
pub const ARTISTS_BATCH: usize = 50;

pub async fn fetch_all_playlists(gateway: &dyn SpotifyGateway) -> Result<Vec<SimplifiedPlaylist>> {
    let mut playlists = Vec::new();
    let mut offset = 0;
    loop {
        let page = gateway.playlists_page(offset, PAGE_LIMIT).await?;
        let fetched = page.items.len() as u32;
        playlists.extend(page.items);
        offset += fetched;
        if page.next.is_none() || fetched == 0 {
            break;
        }
    }
    Ok(playlists)
}

pub async fn fetch_playlist_items(
    gateway: &dyn SpotifyGateway,
    playlist_id: &str,
) -> Result<Vec<PlaylistItem>> {
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = gateway
            .playlist_items_page(playlist_id, offset, ITEMS_PAGE_LIMIT)
            .await?;
        let fetched = page.items.len() as u32;
        items.extend(page.items);
        offset += fetched;
        if page.next.is_none() || fetched == 0 {
            break;
        }
    }
    Ok(items)
}

/// Track uris of a playlist in playlist order, duplicates kept.
pub async fn fetch_playlist_track_uris(
    gateway: &dyn SpotifyGateway,
    playlist_id: &str,
) -> Result<Vec<String>> {
    let items = fetch_playlist_items(gateway, playlist_id).await?;
    Ok(items
        .into_iter()
        .filter_map(|item| item.track.map(|t| t.uri))
        .collect())
}

pub async fn fetch_liked_songs(gateway: &dyn SpotifyGateway) -> Result<Vec<SavedTrack>> {
    let mut saved = Vec::new();
    let mut offset = 0;
    loop {
        let page = gateway.liked_songs_page(offset, PAGE_LIMIT).await?;
        let fetched = page.items.len() as u32;
        saved.extend(page.items);
        offset += fetched;
        if page.next.is_none() || fetched == 0 {
            break;
        }
    }
    Ok(saved)
}

/// Appends `uris` in list order, in batches the API accepts.
pub async fn add_tracks_batched(
    gateway: &dyn SpotifyGateway,
    playlist_id: &str,
    uris: &[String],
) -> Result<usize> {
    for chunk in uris.chunks(ADD_TRACKS_BATCH) {
        gateway.add_tracks(playlist_id, chunk).await?;
    }
    Ok(uris.len())
}
