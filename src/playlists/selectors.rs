use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::{
    playlists::{Period, PlaylistKind},
    types::HistoryEvent,
};

/// Picks the ordered, duplicate free track uris for a managed playlist.
pub trait TrackSelector {
    fn select(&self, period: Period, kind: PlaylistKind) -> Vec<String>;
}

/// Selector over the snapshot: liked-song additions for Finds, streaming
/// history for the history-derived kinds.
pub struct SnapshotSelector<'a> {
    liked: &'a [(DateTime<Utc>, String)],
    history: &'a [HistoryEvent],
    limit: usize,
}

impl<'a> SnapshotSelector<'a> {
    /// `liked` must be sorted by addition time and `history` by timestamp.
    pub fn new(
        liked: &'a [(DateTime<Utc>, String)],
        history: &'a [HistoryEvent],
        limit: usize,
    ) -> Self {
        Self {
            liked,
            history,
            limit,
        }
    }
}

impl TrackSelector for SnapshotSelector<'_> {
    fn select(&self, period: Period, kind: PlaylistKind) -> Vec<String> {
        match kind {
            PlaylistKind::Finds => liked_in_period(self.liked, period),
            PlaylistKind::MostPlayed => most_played(self.history, period, self.limit),
            PlaylistKind::Discovery => discovery(self.history, period, self.limit),
        }
    }
}

/// Liked songs added inside `period`, in order of addition.
pub fn liked_in_period(liked: &[(DateTime<Utc>, String)], period: Period) -> Vec<String> {
    dedupe(
        liked
            .iter()
            .filter(|(added_at, _)| period.contains(added_at))
            .map(|(_, uri)| uri.clone()),
    )
}

/// Play counts per uri inside `period`.
pub fn play_counts(history: &[HistoryEvent], period: Period) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for event in history.iter().filter(|e| period.contains(&e.timestamp)) {
        *counts.entry(event.track_uri.clone()).or_insert(0) += 1;
    }
    counts
}

/// Most played tracks of `period` by play count, ties in order of first play.
pub fn most_played(history: &[HistoryEvent], period: Period, limit: usize) -> Vec<String> {
    let counts = play_counts(history, period);
    let encountered = dedupe(
        history
            .iter()
            .filter(|e| period.contains(&e.timestamp))
            .map(|e| e.track_uri.clone()),
    );
    let mut ranked = rank_by_play_count(encountered, &counts);
    ranked.truncate(limit);
    ranked
}

/// Tracks whose first ever play falls inside `period`, most recent first.
pub fn discovery(history: &[HistoryEvent], period: Period, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut first_plays: Vec<(&DateTime<Utc>, &str)> = Vec::new();
    for event in history {
        if seen.insert(event.track_uri.as_str()) && period.contains(&event.timestamp) {
            first_plays.push((&event.timestamp, event.track_uri.as_str()));
        }
    }
    first_plays.reverse();
    first_plays
        .into_iter()
        .take(limit)
        .map(|(_, uri)| uri.to_string())
        .collect()
}

/// Stable sort by descending play count. Uris without plays keep their
/// relative order at the end.
pub fn rank_by_play_count(uris: Vec<String>, counts: &HashMap<String, usize>) -> Vec<String> {
    let mut ranked = uris;
    ranked.sort_by_key(|uri| std::cmp::Reverse(counts.get(uri).copied().unwrap_or(0)));
    ranked
}

/// Removes repeated uris, keeping the first occurrence.
pub fn dedupe(uris: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    uris.into_iter()
        .filter(|uri| seen.insert(uri.clone()))
        .collect()
}
