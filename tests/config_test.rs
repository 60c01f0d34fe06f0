use std::collections::HashMap;

use archivist::{
    Error,
    config::{Credentials, Settings, parse_rename_map},
    playlists::{Period, PlaylistKind, YearMonth},
};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_settings_from_lookup() {
    let settings = Settings::from_lookup(lookup(&[
        ("PLAYLIST_OWNER_NAME", "JD"),
        ("PLAYLIST_PREFIX", "Picks"),
        ("PLAYLIST_DATE_FORMAT", "numeric"),
        ("KEEP_MONTHLY_MONTHS", "6"),
        ("PLAYLIST_ENABLE_DISCOVERY", "no"),
        ("SYNC_OWNED_ONLY", "false"),
        ("ARCHIVIST_DATA_DIR", "/tmp/archivist-test"),
        ("PLAYLIST_RENAME_MAP", "Old=>New; Gym => Workout"),
    ]))
    .unwrap();

    let nov = Period::Month(YearMonth::new(2024, 11));
    assert_eq!(settings.naming.name_for(PlaylistKind::Finds, nov), "JDPicks112024");
    assert_eq!(
        settings.naming.name_for(PlaylistKind::Finds, Period::Year(2024)),
        "JDPicks24"
    );
    assert_eq!(settings.keep_monthly_months, 6);
    assert!(!settings.owned_only);
    assert_eq!(settings.data_dir.to_str(), Some("/tmp/archivist-test"));
    assert_eq!(
        settings.enabled_kinds(),
        vec![PlaylistKind::Finds, PlaylistKind::MostPlayed]
    );
    assert_eq!(
        settings.rename_map,
        vec![
            ("Old".to_string(), "New".to_string()),
            ("Gym".to_string(), "Workout".to_string()),
        ]
    );
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let settings = Settings::from_lookup(lookup(&[("PLAYLIST_OWNER_NAME", "  ")])).unwrap();
    let defaults = Settings::default();

    assert_eq!(settings.naming.owner, defaults.naming.owner);
    assert_eq!(settings.keep_monthly_months, 3);
    assert!(settings.include_liked_songs);
}

#[test]
fn test_invalid_values_are_config_errors() {
    assert!(matches!(
        Settings::from_lookup(lookup(&[("KEEP_MONTHLY_MONTHS", "three")])),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Settings::from_lookup(lookup(&[("PLAYLIST_DATE_FORMAT", "roman")])),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Settings::from_lookup(lookup(&[("PLAYLIST_RENAME_MAP", "no arrow")])),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_credentials() {
    assert!(matches!(
        Credentials::from_lookup(lookup(&[])),
        Err(Error::Config(_))
    ));

    let credentials =
        Credentials::from_lookup(lookup(&[("SPOTIFY_API_AUTH_CLIENT_ID", "abc")])).unwrap();
    assert_eq!(credentials.client_id, "abc");
    assert!(credentials.client_secret.is_none());
    assert_eq!(credentials.redirect_uri, "http://127.0.0.1:8888/callback");
}

#[test]
fn test_parse_rename_map() {
    assert_eq!(parse_rename_map("").unwrap(), Vec::new());
    assert_eq!(
        parse_rename_map("A=>B;").unwrap(),
        vec![("A".to_string(), "B".to_string())]
    );
    assert!(parse_rename_map("=>B").is_err());
}
