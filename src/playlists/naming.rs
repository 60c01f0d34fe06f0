use std::{collections::HashMap, fmt};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::config::{Capitalization, DateFormat, NamingConfig, Separator};

/// First year for which managed names are recognised.
const FIRST_NAMED_YEAR: i32 = 2008;

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The families of managed playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaylistKind {
    /// Liked songs by month of addition.
    Finds,
    /// Most played tracks from streaming history.
    MostPlayed,
    /// Tracks first played in the period.
    Discovery,
}

impl PlaylistKind {
    pub const ALL: [PlaylistKind; 3] = [
        PlaylistKind::Finds,
        PlaylistKind::MostPlayed,
        PlaylistKind::Discovery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlaylistKind::Finds => "Finds",
            PlaylistKind::MostPlayed => "Top",
            PlaylistKind::Discovery => "Discovery",
        }
    }

    /// Text in front of the period in generated descriptions.
    pub fn base_description(&self) -> &'static str {
        match self {
            PlaylistKind::Finds => "Liked songs",
            PlaylistKind::MostPlayed => "Most played",
            PlaylistKind::Discovery => "Discovery",
        }
    }
}

impl fmt::Display for PlaylistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn short_name(&self) -> &'static str {
        MONTHS_SHORT[(self.month as usize).saturating_sub(1) % 12]
    }

    pub fn long_name(&self) -> &'static str {
        MONTHS_LONG[(self.month as usize).saturating_sub(1) % 12]
    }

    /// Human label, e.g. `Nov 2024`.
    pub fn label(&self) -> String {
        format!("{} {}", self.short_name(), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Time window a managed playlist covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Month(YearMonth),
    Year(i32),
}

impl Period {
    pub fn year(&self) -> i32 {
        match self {
            Period::Month(ym) => ym.year,
            Period::Year(year) => *year,
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        match self {
            Period::Month(ym) => YearMonth::of(timestamp) == *ym,
            Period::Year(year) => timestamp.year() == *year,
        }
    }

    /// `Nov 2024` for months, `2024` for years.
    pub fn label(&self) -> String {
        match self {
            Period::Month(ym) => ym.label(),
            Period::Year(year) => year.to_string(),
        }
    }
}

/// The last `n` calendar months up to and including the month of `today`,
/// oldest first. The current month is always part of the window.
pub fn last_n_months(today: NaiveDate, n: u32) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = YearMonth::of(&today);
    for _ in 0..n.max(1) {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

/// First day of the oldest month still kept as a monthly playlist.
pub fn window_start(today: NaiveDate, keep_last_n_months: u32) -> NaiveDate {
    let back = keep_last_n_months.max(1) - 1;
    let first_of_month = today.with_day(1).unwrap_or(today);
    first_of_month
        .checked_sub_months(Months::new(back))
        .unwrap_or(first_of_month)
}

impl NamingConfig {
    fn prefix_for(&self, kind: PlaylistKind, yearly: bool) -> &str {
        match (kind, yearly) {
            (PlaylistKind::Finds, false) => &self.prefix_monthly,
            (PlaylistKind::Finds, true) => &self.prefix_yearly,
            (PlaylistKind::MostPlayed, _) => &self.prefix_most_played,
            (PlaylistKind::Discovery, _) => &self.prefix_discovery,
        }
    }

    /// Name of the monthly playlist, e.g. `AJFindsNov24`.
    pub fn monthly_name(&self, kind: PlaylistKind, month: YearMonth) -> String {
        self.render(
            &self.template_monthly,
            self.prefix_for(kind, false),
            Some(month.month),
            month.year,
        )
    }

    /// Name of the yearly playlist, e.g. `AJFinds24`. Always uses the two
    /// digit year.
    pub fn yearly_name(&self, kind: PlaylistKind, year: i32) -> String {
        self.render(&self.template_yearly, self.prefix_for(kind, true), None, year)
    }

    pub fn name_for(&self, kind: PlaylistKind, period: Period) -> String {
        match period {
            Period::Month(ym) => self.monthly_name(kind, ym),
            Period::Year(year) => self.yearly_name(kind, year),
        }
    }

    /// Description for a freshly created playlist, e.g.
    /// `Liked songs from Nov 2024`.
    pub fn description_for(&self, kind: PlaylistKind, period: Period) -> String {
        self.description_template
            .replace("{description}", kind.base_description())
            .replace("{period}", &period.label())
            .replace("{date}", "")
            .replace("{type}", kind.label())
            .replace("{genre}", "")
            .trim()
            .to_string()
    }

    fn render(&self, template: &str, prefix: &str, month: Option<u32>, year: i32) -> String {
        let short_year = format!("{:02}", year.rem_euclid(100));
        let owner = capitalize(&self.owner, self.capitalization);
        let prefix = capitalize(prefix, self.capitalization);

        let (date_part, year_part) = match month {
            Some(m) => {
                let index = (m as usize).saturating_sub(1) % 12;
                let (mon, year_str) = match self.date_format {
                    DateFormat::Numeric => (format!("{m:02}"), year.to_string()),
                    DateFormat::Medium | DateFormat::Long => {
                        (MONTHS_LONG[index].to_string(), year.to_string())
                    }
                    DateFormat::Short => (MONTHS_SHORT[index].to_string(), short_year),
                };
                let mon = capitalize(&mon, self.capitalization);
                let year_str = capitalize(&year_str, self.capitalization);
                (
                    format!("{mon}{}{year_str}", self.separator_month.as_str()),
                    String::new(),
                )
            }
            None => (String::new(), short_year),
        };

        let owner_prefix = if self.separator_prefix != Separator::None
            && !owner.is_empty()
            && !prefix.is_empty()
        {
            format!("{owner}{}{prefix}", self.separator_prefix.as_str())
        } else {
            format!("{owner}{prefix}")
        };

        template
            .replace("{owner}{prefix}", &owner_prefix)
            .replace("{owner}", &owner)
            .replace("{prefix}", &prefix)
            .replace("{genre}", "")
            .replace("{mon}", &date_part)
            .replace("{year}", &year_part)
    }
}

fn capitalize(text: &str, style: Capitalization) -> String {
    match style {
        Capitalization::Upper => text.to_uppercase(),
        Capitalization::Lower => text.to_lowercase(),
        Capitalization::Preserve => text.to_string(),
        Capitalization::Title => {
            let mut out = String::with_capacity(text.len());
            let mut previous_is_letter = false;
            for c in text.chars() {
                if previous_is_letter {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                previous_is_letter = c.is_alphabetic();
            }
            out
        }
    }
}

/// Reverse lookup from playlist name to the managed playlist it denotes.
///
/// Built by rendering every monthly and yearly name for every kind over a
/// range of years, so it recognises exactly what [`NamingConfig`] produces.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, (PlaylistKind, Period)>,
}

impl NameIndex {
    pub fn build(naming: &NamingConfig, first_year: i32, last_year: i32) -> Self {
        let mut names = HashMap::new();
        for kind in PlaylistKind::ALL {
            for year in first_year..=last_year {
                for month in 1..=12 {
                    let ym = YearMonth::new(year, month);
                    names
                        .entry(naming.monthly_name(kind, ym))
                        .or_insert((kind, Period::Month(ym)));
                }
                names
                    .entry(naming.yearly_name(kind, year))
                    .or_insert((kind, Period::Year(year)));
            }
        }
        Self { names }
    }

    /// Index covering 2008 up to the year after `today`.
    pub fn for_today(naming: &NamingConfig, today: NaiveDate) -> Self {
        Self::build(naming, FIRST_NAMED_YEAR, today.year() + 1)
    }

    pub fn parse(&self, name: &str) -> Option<(PlaylistKind, Period)> {
        self.names.get(name).copied()
    }

    pub fn is_managed(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}
