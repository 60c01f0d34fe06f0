mod common;

use archivist::{
    Error,
    management::{BackupStore, PlaylistTrackCache},
    playlists::safe_delete_playlist,
    types::LIKED_SONGS_PLAYLIST_ID,
};
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_deletion_refused_when_successor_lacks_tracks() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let target = gateway.add_playlist("AJFindsJan24", USER, &uris(1..=3));
    let successor = gateway.add_playlist("AJFinds24", USER, &uris(1..=2));
    let backups = BackupStore::in_data_dir(dir.path());
    let mut cache = PlaylistTrackCache::new();

    let outcome = safe_delete_playlist(
        gateway.as_ref(),
        &backups,
        &mut cache,
        &target,
        "AJFindsJan24",
        true,
        Some(&successor),
    )
    .await
    .unwrap();

    assert!(!outcome.deleted);
    assert_eq!(outcome.missing, vec![uri(3)]);
    assert!(gateway.playlist_named("AJFindsJan24").is_some());
    let backup = outcome.backup.expect("backup written before verification");
    let saved = BackupStore::read(&backup).await.unwrap();
    assert_eq!(saved.tracks, uris(1..=3));
    assert_eq!(saved.name, "AJFindsJan24");
}

#[tokio::test]
async fn test_deletion_after_successful_verification() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let target = gateway.add_playlist("AJFindsJan24", USER, &uris(1..=2));
    let successor = gateway.add_playlist("AJFinds24", USER, &uris(1..=5));
    let backups = BackupStore::in_data_dir(dir.path());
    let mut cache = PlaylistTrackCache::new();

    let outcome = safe_delete_playlist(
        gateway.as_ref(),
        &backups,
        &mut cache,
        &target,
        "AJFindsJan24",
        true,
        Some(&successor),
    )
    .await
    .unwrap();

    assert!(outcome.deleted);
    assert!(outcome.missing.is_empty());
    assert!(gateway.playlist_named("AJFindsJan24").is_none());
    assert_eq!(gateway.mutations(), vec![format!("delete {target}")]);
    assert_eq!(backups.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_successor_cache_is_not_trusted() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let target = gateway.add_playlist("AJFindsJan24", USER, &uris(1..=2));
    let successor = gateway.add_playlist("AJFinds24", USER, &[uri(1)]);
    let backups = BackupStore::in_data_dir(dir.path());
    let mut cache = PlaylistTrackCache::new();
    cache.insert(successor.clone(), uris(1..=2));

    let outcome = safe_delete_playlist(
        gateway.as_ref(),
        &backups,
        &mut cache,
        &target,
        "AJFindsJan24",
        false,
        Some(&successor),
    )
    .await
    .unwrap();

    assert!(!outcome.deleted);
    assert_eq!(outcome.missing, vec![uri(2)]);
    assert!(outcome.backup.is_none());
}

#[tokio::test]
async fn test_liked_songs_can_never_be_deleted() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let backups = BackupStore::in_data_dir(dir.path());
    let mut cache = PlaylistTrackCache::new();

    let result = safe_delete_playlist(
        gateway.as_ref(),
        &backups,
        &mut cache,
        LIKED_SONGS_PLAYLIST_ID,
        "Liked Songs",
        true,
        None,
    )
    .await;

    assert!(matches!(result, Err(Error::Integrity(_))));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_playlist_cannot_be_its_own_successor() {
    let dir = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let target = gateway.add_playlist("Mix", USER, &uris(1..=2));
    let backups = BackupStore::in_data_dir(dir.path());
    let mut cache = PlaylistTrackCache::new();

    let result = safe_delete_playlist(
        gateway.as_ref(),
        &backups,
        &mut cache,
        &target,
        "Mix",
        true,
        Some(&target),
    )
    .await;

    assert!(matches!(result, Err(Error::Integrity(_))));
    assert!(gateway.playlist_named("Mix").is_some());
}
