//! Read-only reports over the snapshot: playlist health and listening
//! insights.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tabled::Table;

use crate::{
    info,
    management::Library,
    types::{CountTableRow, HealthTableRow, HistoryEvent, LIKED_SONGS_PLAYLIST_ID},
};

const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistHealth {
    pub playlist_id: String,
    pub name: String,
    pub tracks: u64,
    pub score: i32,
    pub issues: Vec<String>,
}

/// Scores every owned playlist, worst first.
///
/// Starts at 100: -20 below 10 tracks, -10 above 500, -2 per duplicate
/// (at most -20), -5 when some track lacks popularity, +5 when the artists
/// span at least 5 genres. The result is clamped to 0..=100.
pub fn health_check(library: &Library) -> Vec<PlaylistHealth> {
    let tracks = library.track_index();
    let artists = library.artist_index();

    let mut report: Vec<PlaylistHealth> = library
        .playlists
        .iter()
        .filter(|p| p.is_owned && p.id != LIKED_SONGS_PLAYLIST_ID)
        .map(|playlist| {
            let members = library.playlist_tracks(&playlist.id);
            let count = members.len() as u64;
            let unique: HashSet<&str> = members.iter().map(|m| m.track_id.as_str()).collect();
            let duplicates = members.len() - unique.len();

            let missing_popularity = unique
                .iter()
                .any(|id| tracks.get(id).is_none_or(|t| t.popularity.is_none()));
            let genres: BTreeSet<&str> = unique
                .iter()
                .filter_map(|id| tracks.get(id))
                .flat_map(|t| t.artist_ids.iter())
                .filter_map(|a| artists.get(a.as_str()))
                .flat_map(|a| a.genres.iter().map(String::as_str))
                .collect();

            let mut score: i32 = 100;
            let mut issues = Vec::new();
            if count < 10 {
                score -= 20;
                issues.push(format!("only {count} tracks"));
            }
            if count > 500 {
                score -= 10;
                issues.push(format!("{count} tracks"));
            }
            if duplicates > 0 {
                score -= (2 * duplicates as i32).min(20);
                issues.push(format!("{duplicates} duplicates"));
            }
            if missing_popularity && count > 0 {
                score -= 5;
                issues.push("missing popularity".to_string());
            }
            if genres.len() >= 5 {
                score += 5;
            }

            PlaylistHealth {
                playlist_id: playlist.id.clone(),
                name: playlist.name.clone(),
                tracks: count,
                score: score.clamp(0, 100),
                issues,
            }
        })
        .collect();

    report.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.name.cmp(&b.name)));
    report
}

pub fn health_rows(report: &[PlaylistHealth]) -> Vec<HealthTableRow> {
    report
        .iter()
        .map(|h| HealthTableRow {
            playlist: h.name.clone(),
            tracks: h.tracks,
            score: h.score,
            issues: h.issues.join(", "),
        })
        .collect()
}

pub fn print_health(report: &[PlaylistHealth]) {
    if report.is_empty() {
        info!("No owned playlists in the snapshot");
        return;
    }
    let average = report.iter().map(|h| h.score as i64).sum::<i64>() / report.len() as i64;
    println!("{}", Table::new(health_rows(report)));
    info!("Average health score: {} over {} playlists", average, report.len());
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insights {
    pub playlists: usize,
    pub tracks: usize,
    pub artists: usize,
    pub liked_songs: usize,
    pub history_events: usize,
    /// Genres by number of tracks carrying them.
    pub top_genres: Vec<(String, u64)>,
    /// Artists by plays over the last 30 days.
    pub top_artists: Vec<(String, u64)>,
    pub minutes_last_30_days: u64,
}

pub fn insights(library: &Library, history: &[HistoryEvent], now: DateTime<Utc>) -> Insights {
    let artists = library.artist_index();

    let mut genre_counts: HashMap<&str, u64> = HashMap::new();
    for track in &library.tracks {
        let genres: BTreeSet<&str> = track
            .artist_ids
            .iter()
            .filter_map(|a| artists.get(a.as_str()))
            .flat_map(|a| a.genres.iter().map(String::as_str))
            .collect();
        for genre in genres {
            *genre_counts.entry(genre).or_insert(0) += 1;
        }
    }

    let by_uri: HashMap<&str, &Vec<String>> = library
        .tracks
        .iter()
        .map(|t| (t.uri.as_str(), &t.artist_ids))
        .collect();
    let since = now - Duration::days(30);
    let mut artist_plays: HashMap<&str, u64> = HashMap::new();
    let mut ms_played: u64 = 0;
    for event in history.iter().filter(|e| e.timestamp >= since && e.timestamp <= now) {
        ms_played += event.ms_played;
        let Some(artist_ids) = by_uri.get(event.track_uri.as_str()) else {
            continue;
        };
        for artist in artist_ids.iter().filter_map(|id| artists.get(id.as_str())) {
            *artist_plays.entry(artist.name.as_str()).or_insert(0) += 1;
        }
    }

    Insights {
        playlists: library.playlists.len(),
        tracks: library.tracks.len(),
        artists: library.artists.len(),
        liked_songs: library.playlist_tracks(LIKED_SONGS_PLAYLIST_ID).len(),
        history_events: history.len(),
        top_genres: top(genre_counts),
        top_artists: top(artist_plays),
        minutes_last_30_days: ms_played / 60_000,
    }
}

/// Highest counts first, ties by name.
fn top(counts: HashMap<&str, u64>) -> Vec<(String, u64)> {
    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .take(TOP_N)
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

pub fn count_rows(counts: &[(String, u64)]) -> Vec<CountTableRow> {
    counts
        .iter()
        .map(|(name, count)| CountTableRow {
            name: name.clone(),
            count: *count,
        })
        .collect()
}

pub fn print_insights(insights: &Insights) {
    info!(
        "{} playlists, {} tracks, {} artists, {} liked songs, {} history events",
        insights.playlists,
        insights.tracks,
        insights.artists,
        insights.liked_songs,
        insights.history_events
    );
    if !insights.top_genres.is_empty() {
        info!("Top genres");
        println!("{}", Table::new(count_rows(&insights.top_genres)));
    }
    if !insights.top_artists.is_empty() {
        info!("Top artists, last 30 days");
        println!("{}", Table::new(count_rows(&insights.top_artists)));
    }
    info!("Listening time, last 30 days: {} minutes", insights.minutes_last_30_days);
}
