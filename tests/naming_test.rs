use archivist::{
    config::{Capitalization, DateFormat, NamingConfig, Separator},
    playlists::{NameIndex, Period, PlaylistKind, YearMonth, last_n_months, window_start},
};
use chrono::NaiveDate;

fn nov_2024() -> Period {
    Period::Month(YearMonth::new(2024, 11))
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn test_default_names() {
    let naming = NamingConfig::default();

    assert_eq!(naming.name_for(PlaylistKind::Finds, nov_2024()), "AJFindsNov24");
    assert_eq!(naming.name_for(PlaylistKind::Finds, Period::Year(2024)), "AJFinds24");
    assert_eq!(naming.name_for(PlaylistKind::MostPlayed, Period::Year(2024)), "AJTop24");
    assert_eq!(
        naming.name_for(PlaylistKind::Discovery, Period::Year(2009)),
        "AJDiscovery09"
    );
}

#[test]
fn test_medium_format_with_dash() {
    let naming = NamingConfig {
        date_format: DateFormat::Medium,
        separator_month: Separator::Dash,
        ..NamingConfig::default()
    };

    assert_eq!(
        naming.name_for(PlaylistKind::Finds, nov_2024()),
        "AJFindsNovember-2024"
    );
    // Yearly names keep the two digit year.
    assert_eq!(naming.name_for(PlaylistKind::Finds, Period::Year(2024)), "AJFinds24");
}

#[test]
fn test_prefix_separator() {
    let naming = NamingConfig {
        separator_prefix: Separator::Space,
        ..NamingConfig::default()
    };
    assert_eq!(naming.name_for(PlaylistKind::Finds, nov_2024()), "AJ FindsNov24");

    let no_owner = NamingConfig {
        owner: String::new(),
        separator_prefix: Separator::Space,
        ..NamingConfig::default()
    };
    assert_eq!(no_owner.name_for(PlaylistKind::Finds, nov_2024()), "FindsNov24");
}

#[test]
fn test_numeric_format() {
    let naming = NamingConfig {
        date_format: DateFormat::Numeric,
        ..NamingConfig::default()
    };

    assert_eq!(naming.name_for(PlaylistKind::Finds, nov_2024()), "AJFinds112024");
    assert_eq!(
        naming.name_for(PlaylistKind::Finds, Period::Month(YearMonth::new(2024, 3))),
        "AJFinds032024"
    );
}

#[test]
fn test_capitalization() {
    let title = NamingConfig {
        owner: "aj".to_string(),
        capitalization: Capitalization::Title,
        ..NamingConfig::default()
    };
    assert_eq!(title.name_for(PlaylistKind::Finds, nov_2024()), "AjFindsNov24");

    let upper = NamingConfig {
        capitalization: Capitalization::Upper,
        ..NamingConfig::default()
    };
    assert_eq!(upper.name_for(PlaylistKind::Finds, nov_2024()), "AJFINDSNOV24");

    let lower = NamingConfig {
        capitalization: Capitalization::Lower,
        ..NamingConfig::default()
    };
    assert_eq!(lower.name_for(PlaylistKind::MostPlayed, Period::Year(2024)), "ajtop24");
}

#[test]
fn test_name_index_recognises_rendered_names() {
    let naming = NamingConfig::default();
    let index = NameIndex::for_today(&naming, date(2024, 11, 15));

    assert_eq!(
        index.parse("AJFindsNov24"),
        Some((PlaylistKind::Finds, nov_2024()))
    );
    assert_eq!(
        index.parse("AJTop23"),
        Some((PlaylistKind::MostPlayed, Period::Year(2023)))
    );
    assert_eq!(
        index.parse("AJDiscoveryMar25"),
        Some((PlaylistKind::Discovery, Period::Month(YearMonth::new(2025, 3))))
    );
    assert!(!index.is_managed("Road trip"));
    assert!(!index.is_managed("AJFindsNov24 Hip Hop"));
}

#[test]
fn test_last_n_months() {
    let months = last_n_months(date(2024, 11, 15), 3);
    assert_eq!(
        months,
        vec![
            YearMonth::new(2024, 9),
            YearMonth::new(2024, 10),
            YearMonth::new(2024, 11),
        ]
    );

    let across_new_year = last_n_months(date(2025, 2, 1), 4);
    assert_eq!(
        across_new_year,
        vec![
            YearMonth::new(2024, 11),
            YearMonth::new(2024, 12),
            YearMonth::new(2025, 1),
            YearMonth::new(2025, 2),
        ]
    );

    // The current month is always kept.
    assert_eq!(last_n_months(date(2024, 11, 15), 0), vec![YearMonth::new(2024, 11)]);
}

#[test]
fn test_window_start() {
    assert_eq!(window_start(date(2024, 11, 15), 3), date(2024, 9, 1));
    assert_eq!(window_start(date(2025, 1, 31), 2), date(2024, 12, 1));
    assert_eq!(window_start(date(2024, 11, 15), 1), date(2024, 11, 1));
}

#[test]
fn test_descriptions_and_labels() {
    let naming = NamingConfig::default();

    assert_eq!(
        naming.description_for(PlaylistKind::Finds, nov_2024()),
        "Liked songs from Nov 2024"
    );
    assert_eq!(
        naming.description_for(PlaylistKind::MostPlayed, Period::Year(2023)),
        "Most played from 2023"
    );
    assert_eq!(nov_2024().label(), "Nov 2024");
    assert_eq!(YearMonth::new(2024, 1).previous(), YearMonth::new(2023, 12));
}
