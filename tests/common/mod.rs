#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{Arc, Mutex},
};

use archivist::{
    Error, Result,
    config::Settings,
    management::SnapshotStore,
    playlists::Reconciler,
    spotify::SpotifyGateway,
    types::{
        FullArtist, HistoryEvent, LIKED_SONGS_PLAYLIST_ID, MembershipRow, Page, PlaylistItem,
        PlaylistMeta, PlaylistOwner, SavedTrack, SimplifiedArtist, SimplifiedPlaylist, Track,
        TracksRef, User,
    },
    workflow,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub const USER: &str = "me";

pub fn uri(n: u32) -> String {
    format!("spotify:track:t{n}")
}

pub fn uris(range: impl IntoIterator<Item = u32>) -> Vec<String> {
    range.into_iter().map(uri).collect()
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid test date")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn settings(dir: &Path) -> Settings {
    Settings {
        data_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}

pub async fn reconciler(
    gateway: &Arc<FakeGateway>,
    settings: Settings,
    today: NaiveDate,
) -> Reconciler {
    let gateway: Arc<dyn SpotifyGateway> = gateway.clone();
    workflow::open_reconciler(gateway, Arc::new(settings), false, today).await
}

/// Stores liked-song additions in the snapshot, as a sync would.
pub async fn seed_liked(dir: &Path, liked: &[(String, DateTime<Utc>)]) {
    let store = SnapshotStore::new(dir);
    let mut library = store.load_library().await.unwrap();
    let rows = liked
        .iter()
        .enumerate()
        .map(|(position, (uri, added_at))| MembershipRow {
            playlist_id: LIKED_SONGS_PLAYLIST_ID.to_string(),
            track_id: uri.rsplit(':').next().unwrap().to_string(),
            track_uri: uri.clone(),
            position: position as u32,
            added_at: Some(*added_at),
        })
        .collect();
    library.replace_memberships(LIKED_SONGS_PLAYLIST_ID, rows);
    store.save_library(&library).await.unwrap();
}

pub async fn seed_history(dir: &Path, plays: &[(String, DateTime<Utc>)]) {
    let events: Vec<HistoryEvent> = plays
        .iter()
        .map(|(uri, timestamp)| HistoryEvent {
            track_uri: uri.clone(),
            timestamp: *timestamp,
            ms_played: 120_000,
        })
        .collect();
    SnapshotStore::new(dir).save_history(&events).await.unwrap();
}

#[derive(Debug, Clone)]
pub struct FakePlaylist {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub version: u64,
    pub items: Vec<(String, Option<DateTime<Utc>>)>,
}

impl FakePlaylist {
    fn snapshot_id(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    playlists: Vec<FakePlaylist>,
    /// Most recent first, like the saved tracks endpoint.
    liked: Vec<(DateTime<Utc>, String)>,
    artists: HashMap<String, FullArtist>,
    next_id: u64,
    mutations: Vec<String>,
    calls: usize,
    reject_non_ascii: bool,
    vanishing: HashSet<String>,
    unavailable: HashSet<String>,
}

/// In-memory Spotify with a log of every mutating call.
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_playlist(&self, name: &str, owner: &str, uris: &[String]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("pl{}", state.next_id);
        state.playlists.push(FakePlaylist {
            id: id.clone(),
            name: name.to_string(),
            owner: owner.to_string(),
            description: String::new(),
            version: 1,
            items: uris.iter().map(|u| (u.clone(), None)).collect(),
        });
        id
    }

    pub fn like(&self, uri: &str, added_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.liked.push((added_at, uri.to_string()));
        state.liked.sort_by(|a, b| b.0.cmp(&a.0));
    }

    pub fn add_artist(&self, id: &str, name: &str, genres: &[&str]) {
        self.state.lock().unwrap().artists.insert(
            id.to_string(),
            FullArtist {
                id: id.to_string(),
                name: name.to_string(),
                genres: genres.iter().map(|g| g.to_string()).collect(),
                popularity: Some(40),
            },
        );
    }

    /// Appends tracks as if the user did it in the app.
    pub fn user_adds(&self, playlist_id: &str, uris: &[String]) {
        let mut state = self.state.lock().unwrap();
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .expect("known playlist");
        playlist.items.extend(uris.iter().map(|u| (u.clone(), None)));
        playlist.version += 1;
    }

    /// Items of this playlist answer 404 while it is still listed.
    pub fn vanish_on_fetch(&self, playlist_id: &str) {
        self.state
            .lock()
            .unwrap()
            .vanishing
            .insert(playlist_id.to_string());
    }

    /// Items of this playlist answer 503 until `recover` is called.
    pub fn fail_on_fetch(&self, playlist_id: &str) {
        self.state
            .lock()
            .unwrap()
            .unavailable
            .insert(playlist_id.to_string());
    }

    pub fn recover(&self, playlist_id: &str) {
        self.state.lock().unwrap().unavailable.remove(playlist_id);
    }

    pub fn reject_non_ascii(&self, reject: bool) {
        self.state.lock().unwrap().reject_non_ascii = reject;
    }

    pub fn set_description(&self, playlist_id: &str, description: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.playlists.iter_mut().find(|p| p.id == playlist_id) {
            p.description = description.to_string();
            p.version += 1;
        }
    }

    pub fn playlist_named(&self, name: &str) -> Option<FakePlaylist> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn tracks_of(&self, name: &str) -> Vec<String> {
        self.playlist_named(name)
            .map(|p| p.items.into_iter().map(|(u, _)| u).collect())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.mutations.clear();
        state.calls = 0;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn track(uri: &str) -> Track {
        let id = uri.rsplit(':').next().unwrap_or(uri).to_string();
        Track {
            id: Some(id.clone()),
            name: format!("Track {id}"),
            uri: uri.to_string(),
            duration_ms: 180_000,
            explicit: false,
            popularity: Some(50),
            album: None,
            artists: vec![SimplifiedArtist {
                id: Some(format!("artist-{id}")),
                name: format!("Artist {id}"),
            }],
        }
    }

    fn page<T>(all: Vec<T>, offset: u32, limit: u32) -> Page<T> {
        let total = all.len() as u64;
        let items: Vec<T> = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        let next = (u64::from(offset) + u64::from(limit) < total).then(|| "next".to_string());
        Page { items, total, next }
    }
}

#[async_trait]
impl SpotifyGateway for FakeGateway {
    async fn current_user(&self) -> Result<User> {
        self.state.lock().unwrap().calls += 1;
        Ok(User {
            id: USER.to_string(),
            display_name: None,
        })
    }

    async fn playlists_page(&self, offset: u32, limit: u32) -> Result<Page<SimplifiedPlaylist>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let all = state
            .playlists
            .iter()
            .map(|p| SimplifiedPlaylist {
                id: p.id.clone(),
                name: p.name.clone(),
                description: Some(p.description.clone()),
                owner: PlaylistOwner {
                    id: p.owner.clone(),
                    display_name: None,
                },
                snapshot_id: p.snapshot_id(),
                tracks: TracksRef {
                    total: p.items.len() as u64,
                },
            })
            .collect();
        Ok(Self::page(all, offset, limit))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistMeta> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .map(|p| PlaylistMeta {
                id: p.id.clone(),
                name: p.name.clone(),
                description: Some(p.description.clone()),
                snapshot_id: p.snapshot_id(),
                owner: None,
            })
            .ok_or_else(|| Error::NotFound(playlist_id.to_string()))
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistItem>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.vanishing.contains(playlist_id) {
            return Err(Error::NotFound(playlist_id.to_string()));
        }
        if state.unavailable.contains(playlist_id) {
            return Err(Error::Api {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        let playlist = state
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| Error::NotFound(playlist_id.to_string()))?;
        let all = playlist
            .items
            .iter()
            .map(|(uri, added_at)| PlaylistItem {
                added_at: *added_at,
                track: Some(Self::track(uri)),
            })
            .collect();
        Ok(Self::page(all, offset, limit))
    }

    async fn liked_songs_page(&self, offset: u32, limit: u32) -> Result<Page<SavedTrack>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let all = state
            .liked
            .iter()
            .map(|(added_at, uri)| SavedTrack {
                added_at: *added_at,
                track: Self::track(uri),
            })
            .collect();
        Ok(Self::page(all, offset, limit))
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<FullArtist>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        assert!(ids.len() <= 50, "artists batch too large");
        Ok(ids
            .iter()
            .filter_map(|id| state.artists.get(id).cloned())
            .collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        _public: bool,
    ) -> Result<PlaylistMeta> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.next_id += 1;
        let playlist = FakePlaylist {
            id: format!("pl{}", state.next_id),
            name: name.to_string(),
            owner: user_id.to_string(),
            description: description.to_string(),
            version: 1,
            items: Vec::new(),
        };
        state.mutations.push(format!("create {name}"));
        let meta = PlaylistMeta {
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            description: Some(playlist.description.clone()),
            snapshot_id: playlist.snapshot_id(),
            owner: None,
        };
        state.playlists.push(playlist);
        Ok(meta)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        assert!(uris.len() <= 100, "add batch too large");
        state
            .mutations
            .push(format!("add {playlist_id} {}", uris.len()));
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| Error::NotFound(playlist_id.to_string()))?;
        playlist
            .items
            .extend(uris.iter().map(|u| (u.clone(), Some(Utc::now()))));
        playlist.version += 1;
        Ok(playlist.snapshot_id())
    }

    async fn change_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.reject_non_ascii && description.is_some_and(|d| !d.is_ascii()) {
            state.mutations.push(format!("rejected {playlist_id}"));
            return Err(Error::Validation("invalid description".to_string()));
        }
        state.mutations.push(format!("details {playlist_id}"));
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| Error::NotFound(playlist_id.to_string()))?;
        if let Some(name) = name {
            playlist.name = name.to_string();
        }
        if let Some(description) = description {
            playlist.description = description.to_string();
        }
        playlist.version += 1;
        Ok(())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.mutations.push(format!("delete {playlist_id}"));
        let before = state.playlists.len();
        state.playlists.retain(|p| p.id != playlist_id);
        if state.playlists.len() == before {
            return Err(Error::NotFound(playlist_id.to_string()));
        }
        Ok(())
    }
}
