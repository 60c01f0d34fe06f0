use archivist::{
    management::Library,
    reports::{health_check, health_rows, insights},
    types::{ArtistRow, HistoryEvent, LIKED_SONGS_PLAYLIST_ID, MembershipRow, PlaylistRow, TrackRow},
};
use chrono::{Duration, TimeZone, Utc};

fn playlist(id: &str, name: &str, owned: bool) -> PlaylistRow {
    PlaylistRow {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        owner_id: if owned { "me" } else { "friend" }.to_string(),
        snapshot_id: format!("{id}@1"),
        track_count: 0,
        is_owned: owned,
    }
}

fn track(n: u32, artist: &str, popularity: Option<u32>) -> TrackRow {
    TrackRow {
        id: format!("t{n}"),
        name: format!("Track {n}"),
        uri: format!("spotify:track:t{n}"),
        duration_ms: 200_000,
        explicit: false,
        album_id: None,
        album_name: None,
        artist_ids: vec![artist.to_string()],
        popularity,
        release_year: Some(2020),
    }
}

fn artist(id: &str, genres: &[&str]) -> ArtistRow {
    ArtistRow {
        id: id.to_string(),
        name: format!("Artist {id}"),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        popularity: Some(60),
    }
}

fn members(playlist_id: &str, tracks: &[u32]) -> Vec<MembershipRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(position, n)| MembershipRow {
            playlist_id: playlist_id.to_string(),
            track_id: format!("t{n}"),
            track_uri: format!("spotify:track:t{n}"),
            position: position as u32,
            added_at: None,
        })
        .collect()
}

fn library() -> Library {
    let genres = ["rock", "jazz", "pop", "folk", "soul"];
    let mut library = Library {
        playlists: vec![
            playlist("small", "Small", true),
            playlist("empty", "Empty", true),
            playlist("big", "Big", true),
            playlist("theirs", "Theirs", false),
            playlist(LIKED_SONGS_PLAYLIST_ID, "Liked Songs", true),
        ],
        ..Library::default()
    };
    for (i, genre) in genres.iter().enumerate() {
        library.artists.push(artist(&format!("a{i}"), &[genre]));
    }
    for n in 1..=12 {
        let popularity = if n == 12 { None } else { Some(40) };
        library
            .tracks
            .push(track(n, &format!("a{}", n % 5), popularity));
    }
    library.memberships.extend(members("small", &[1, 2, 1]));
    library.memberships.extend(members("big", &(1..=11).collect::<Vec<_>>()));
    library.memberships.extend(members("theirs", &[3]));
    library.memberships.extend(members(LIKED_SONGS_PLAYLIST_ID, &[12]));
    library
}

#[test]
fn test_health_scores_worst_first() {
    let report = health_check(&library());

    let scores: Vec<(&str, i32)> = report.iter().map(|h| (h.name.as_str(), h.score)).collect();
    // Small: few tracks and one duplicate. Empty: few tracks only. Big: five
    // genres, clamped to 100.
    assert_eq!(scores, vec![("Small", 78), ("Empty", 80), ("Big", 100)]);
    assert_eq!(report[0].issues, vec!["only 3 tracks", "1 duplicates"]);

    let rows = health_rows(&report);
    assert_eq!(rows[0].issues, "only 3 tracks, 1 duplicates");
}

#[test]
fn test_missing_popularity_costs_points() {
    let mut library = library();
    library.memberships.extend(members("big", &[12]));

    let report = health_check(&library);

    let big = report.iter().find(|h| h.name == "Big").unwrap();
    assert_eq!(big.score, 100);
    assert!(big.issues.contains(&"missing popularity".to_string()));
}

#[test]
fn test_insights() {
    let library = library();
    let now = Utc.with_ymd_and_hms(2024, 11, 15, 12, 0, 0).unwrap();
    let history = vec![
        HistoryEvent {
            track_uri: "spotify:track:t1".to_string(),
            timestamp: now - Duration::days(1),
            ms_played: 120_000,
        },
        HistoryEvent {
            track_uri: "spotify:track:t6".to_string(),
            timestamp: now - Duration::days(2),
            ms_played: 60_000,
        },
        HistoryEvent {
            track_uri: "spotify:track:t2".to_string(),
            timestamp: now - Duration::days(3),
            ms_played: 60_000,
        },
        HistoryEvent {
            track_uri: "spotify:track:t2".to_string(),
            timestamp: now - Duration::days(90),
            ms_played: 600_000,
        },
    ];

    let insights = insights(&library, &history, now);

    assert_eq!(insights.playlists, 5);
    assert_eq!(insights.tracks, 12);
    assert_eq!(insights.artists, 5);
    assert_eq!(insights.liked_songs, 1);
    assert_eq!(insights.history_events, 4);
    assert_eq!(insights.minutes_last_30_days, 4);
    // t1 and t6 share artist a1.
    assert_eq!(
        insights.top_artists,
        vec![("Artist a1".to_string(), 2), ("Artist a2".to_string(), 1)]
    );
    // a1 and a2 carry tracks 1, 6, 11 and 2, 7, 12.
    assert_eq!(insights.top_genres[0], ("jazz".to_string(), 3));
    assert_eq!(insights.top_genres.len(), 5);
}
