mod common;

use archivist::playlists::cleanup::strip_genre_suffix;
use common::*;
use tempfile::TempDir;

#[test]
fn test_strip_genre_suffix() {
    assert_eq!(strip_genre_suffix("AJFindsMar24 Hip Hop"), Some("AJFindsMar24"));
    assert_eq!(strip_genre_suffix("AJFindsMar24-HipHop"), Some("AJFindsMar24"));
    assert_eq!(strip_genre_suffix("AJFindsMar24_Dance"), Some("AJFindsMar24"));
    assert_eq!(strip_genre_suffix("AJFindsMar24"), None);
    assert_eq!(strip_genre_suffix("Dance"), None);
}

#[tokio::test]
async fn test_dedupe_keeps_alphabetically_first() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let b = gateway.add_playlist("B list", USER, &[uri(1), uri(2)]);
    gateway.add_playlist("A list", USER, &[uri(2), uri(1)]);
    gateway.add_playlist("C list", USER, &[uri(3)]);
    gateway.add_playlist("Empty one", USER, &[]);
    gateway.add_playlist("Empty two", USER, &[]);
    gateway.add_playlist("Someone else's", "friend", &[uri(1), uri(2)]);

    let mut reconciler = reconciler(&gateway, settings(dir.path()), date(2024, 11, 15)).await;
    let stats = reconciler.dedupe_by_content().await.unwrap();

    assert_eq!(stats.deleted, 1);
    assert_eq!(gateway.mutations(), vec![format!("delete {b}")]);
    let names = gateway.names();
    assert!(names.contains(&"A list".to_string()));
    assert!(names.contains(&"Empty one".to_string()));
    assert!(names.contains(&"Empty two".to_string()));
    assert!(names.contains(&"Someone else's".to_string()));
}

#[tokio::test]
async fn test_genre_playlists_need_a_complete_successor() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    gateway.add_playlist("AJFinds24", USER, &uris(1..=3));
    let dance = gateway.add_playlist("AJFindsOct24 Dance", USER, &uris(1..=2));
    gateway.add_playlist("AJFindsOct24-HipHop", USER, &[uri(1), uri(9)]);

    let mut reconciler = reconciler(&gateway, settings(dir.path()), date(2024, 11, 15)).await;
    let stats = reconciler.delete_monthly_and_genre(3).await.unwrap();

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.kept, 1);
    assert_eq!(gateway.mutations(), vec![format!("delete {dance}")]);
    assert!(gateway.playlist_named("AJFindsOct24-HipHop").is_some());
}

#[tokio::test]
async fn test_legacy_monthly_needs_an_existing_yearly() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    gateway.add_playlist("AJFindsJan23", USER, &[uri(1)]);
    gateway.add_playlist("AJFinds24", USER, &uris(1..=3));
    let february = gateway.add_playlist("AJFindsFeb24", USER, &[uri(2)]);
    gateway.add_playlist("AJFindsOct24", USER, &[uri(7)]);

    let mut reconciler = reconciler(&gateway, settings(dir.path()), date(2024, 11, 15)).await;
    let stats = reconciler.delete_monthly_and_genre(3).await.unwrap();

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.kept, 1);
    assert_eq!(gateway.mutations(), vec![format!("delete {february}")]);
    // No 2023 archive to verify against, and October is still in the window.
    assert!(gateway.playlist_named("AJFindsJan23").is_some());
    assert!(gateway.playlist_named("AJFindsOct24").is_some());
}

#[tokio::test]
async fn test_same_name_duplicates_keep_the_largest() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let small = gateway.add_playlist("AJFinds23", USER, &[uri(1)]);
    let large = gateway.add_playlist("AJFinds23", USER, &uris(1..=2));

    let mut reconciler = reconciler(&gateway, settings(dir.path()), date(2024, 11, 15)).await;
    let stats = reconciler.delete_duplicate_names().await.unwrap();

    assert_eq!(stats.deleted, 1);
    assert_eq!(gateway.mutations(), vec![format!("delete {small}")]);
    assert_eq!(gateway.playlist_named("AJFinds23").unwrap().id, large);
}

#[tokio::test]
async fn test_rename_map() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let old = gateway.add_playlist("Old mix", USER, &[uri(1)]);
    gateway.add_playlist("Taken", USER, &[uri(2)]);
    gateway.add_playlist("Also old", USER, &[uri(3)]);

    let mut settings = settings(dir.path());
    settings.rename_map = vec![
        ("Old mix".to_string(), "New mix".to_string()),
        ("Also old".to_string(), "Taken".to_string()),
    ];
    let mut reconciler = reconciler(&gateway, settings, date(2024, 11, 15)).await;
    let stats = reconciler.rename_playlists().await.unwrap();

    assert_eq!(stats.renamed, 1);
    assert_eq!(gateway.mutations(), vec![format!("details {old}")]);
    assert!(gateway.playlist_named("New mix").is_some());
    assert!(gateway.playlist_named("Also old").is_some());
}
