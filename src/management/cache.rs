use std::collections::HashMap;

/// Run-scoped cache of playlist track uris, owned by whoever reads through it.
///
/// Any mutation of a playlist must invalidate its entry. Verification before a
/// deletion never reads from here.
#[derive(Debug, Default)]
pub struct PlaylistTrackCache {
    tracks: HashMap<String, Vec<String>>,
}

impl PlaylistTrackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, playlist_id: &str) -> Option<&Vec<String>> {
        self.tracks.get(playlist_id)
    }

    pub fn insert(&mut self, playlist_id: impl Into<String>, uris: Vec<String>) {
        self.tracks.insert(playlist_id.into(), uris);
    }

    pub fn invalidate(&mut self, playlist_id: &str) {
        self.tracks.remove(playlist_id);
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
