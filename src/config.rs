//! Configuration management for archivist.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Everything is read once at startup into
//! an immutable [`Settings`] value (plus [`Credentials`] for the API) which is
//! then handed down explicitly; nothing re-reads the environment later.
//!
//! Priority:
//! 1. Command-line overrides (applied by the binary before freezing)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Built-in defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{Error, Result},
    playlists::PlaylistKind,
};

const APP_DIR: &str = "archivist";

/// Loads environment variables from `<data_local_dir>/archivist/.env`.
///
/// A missing file is fine: variables may be provided by the environment
/// directly (e.g. in CI). Variables already set in the process win over the
/// file.
///
/// # Directory Structure
///
/// The file is looked up in:
/// - Linux: `~/.local/share/archivist/.env`
/// - macOS: `~/Library/Application Support/archivist/.env`
/// - Windows: `%LOCALAPPDATA%/archivist/.env`
///
/// The directory is created when it does not exist yet.
///
/// # Errors
///
/// - IO errors when the directory cannot be created
/// - [`Error::Config`] when the file exists but cannot be parsed
pub async fn load_env() -> Result<()> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    async_fs::create_dir_all(&path).await?;
    path.push(".env");

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Default location of the snapshot tables, caches and backups.
///
/// Resolves to `<data_local_dir>/archivist/data`, or `./archivist/data` on
/// platforms without a local data directory. `ARCHIVIST_DATA_DIR` and
/// `--data-dir` override it.
pub fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("data");
    path
}

/// Month/year rendering inside playlist names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Nov24`
    Short,
    /// `November2024`
    Medium,
    /// Same as medium.
    Long,
    /// `112024`
    Numeric,
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            "numeric" => Ok(Self::Numeric),
            other => Err(Error::Config(format!("unknown date format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    None,
    Space,
    Dash,
    Underscore,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::Space => " ",
            Separator::Dash => "-",
            Separator::Underscore => "_",
        }
    }
}

impl FromStr for Separator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "space" => Ok(Self::Space),
            "dash" => Ok(Self::Dash),
            "underscore" => Ok(Self::Underscore),
            other => Err(Error::Config(format!("unknown separator '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capitalization {
    Title,
    Upper,
    Lower,
    Preserve,
}

impl FromStr for Capitalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            "preserve" => Ok(Self::Preserve),
            other => Err(Error::Config(format!("unknown capitalization '{other}'"))),
        }
    }
}

/// Everything needed to render and recognise managed playlist names.
#[derive(Debug, Clone)]
pub struct NamingConfig {
    pub owner: String,
    pub prefix_monthly: String,
    pub prefix_yearly: String,
    pub prefix_most_played: String,
    pub prefix_discovery: String,
    pub template_monthly: String,
    pub template_yearly: String,
    pub date_format: DateFormat,
    pub separator_month: Separator,
    pub separator_prefix: Separator,
    pub capitalization: Capitalization,
    pub description_template: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            owner: "AJ".to_string(),
            prefix_monthly: "Finds".to_string(),
            prefix_yearly: "Finds".to_string(),
            prefix_most_played: "Top".to_string(),
            prefix_discovery: "Discovery".to_string(),
            template_monthly: "{owner}{prefix}{mon}{year}".to_string(),
            template_yearly: "{owner}{prefix}{year}".to_string(),
            date_format: DateFormat::Short,
            separator_month: Separator::None,
            separator_prefix: Separator::None,
            capitalization: Capitalization::Preserve,
            description_template: "{description} from {period}".to_string(),
        }
    }
}

/// Remote API behaviour.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Longest `Retry-After` honoured before the wait is clamped.
    pub max_retry_after: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            max_retries: 6,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            max_retry_after: Duration::from_secs(120),
        }
    }
}

/// Immutable run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub naming: NamingConfig,
    pub enable_monthly: bool,
    pub enable_most_played: bool,
    pub enable_discovery: bool,
    pub keep_monthly_months: u32,
    pub owned_only: bool,
    pub include_liked_songs: bool,
    pub enable_health_check: bool,
    pub enable_insights_report: bool,
    /// Exact-name renames applied by the `rename` step, in order.
    pub rename_map: Vec<(String, String)>,
    /// Number of tracks picked for history-derived playlists.
    pub history_track_limit: usize,
    pub max_description_length: usize,
    pub api: ApiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            naming: NamingConfig::default(),
            enable_monthly: true,
            enable_most_played: true,
            enable_discovery: true,
            keep_monthly_months: 3,
            owned_only: true,
            include_liked_songs: true,
            enable_health_check: false,
            enable_insights_report: false,
            rename_map: Vec::new(),
            history_track_limit: 100,
            max_description_length: 300,
            api: ApiSettings::default(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Call [`load_env`] first so values from the `.env` file are visible.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the raw value for a variable name. Blank values
    ///   are treated as unset.
    ///
    /// # Recognised Variables
    ///
    /// - **Naming**: `PLAYLIST_OWNER_NAME`, `PLAYLIST_PREFIX` (and the
    ///   per-kind `PLAYLIST_PREFIX_*`), `PLAYLIST_TEMPLATE_MONTHLY`,
    ///   `PLAYLIST_TEMPLATE_YEARLY`, `PLAYLIST_DATE_FORMAT`,
    ///   `PLAYLIST_SEPARATOR_MONTH`, `PLAYLIST_SEPARATOR_PREFIX`,
    ///   `PLAYLIST_CAPITALIZATION`, `PLAYLIST_DESCRIPTION_TEMPLATE`
    /// - **Features**: `PLAYLIST_ENABLE_*`, `ENABLE_HEALTH_CHECK`,
    ///   `ENABLE_INSIGHTS_REPORT`
    /// - **Sync**: `KEEP_MONTHLY_MONTHS`, `SYNC_OWNED_ONLY`,
    ///   `SYNC_INCLUDE_LIKED_SONGS`, `ARCHIVIST_DATA_DIR`
    /// - **Cleanup**: `PLAYLIST_RENAME_MAP`
    /// - **API**: `SPOTIFY_API_URL`, `API_MAX_RETRIES`, `HISTORY_TRACK_LIMIT`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for values that do not parse (numbers, date
    /// formats, separators, rename entries). Unset keys fall back to
    /// [`Settings::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_prefix = get("PLAYLIST_PREFIX").unwrap_or(defaults.naming.prefix_monthly.clone());
        let naming = NamingConfig {
            owner: get("PLAYLIST_OWNER_NAME").unwrap_or(defaults.naming.owner.clone()),
            prefix_monthly: get("PLAYLIST_PREFIX_MONTHLY").unwrap_or(base_prefix.clone()),
            prefix_yearly: get("PLAYLIST_PREFIX_YEARLY").unwrap_or(base_prefix),
            prefix_most_played: get("PLAYLIST_PREFIX_MOST_PLAYED")
                .unwrap_or(defaults.naming.prefix_most_played.clone()),
            prefix_discovery: get("PLAYLIST_PREFIX_DISCOVERY")
                .unwrap_or(defaults.naming.prefix_discovery.clone()),
            template_monthly: get("PLAYLIST_TEMPLATE_MONTHLY")
                .unwrap_or(defaults.naming.template_monthly.clone()),
            template_yearly: get("PLAYLIST_TEMPLATE_YEARLY")
                .unwrap_or(defaults.naming.template_yearly.clone()),
            date_format: parse_or(get("PLAYLIST_DATE_FORMAT"), defaults.naming.date_format)?,
            separator_month: parse_or(
                get("PLAYLIST_SEPARATOR_MONTH"),
                defaults.naming.separator_month,
            )?,
            separator_prefix: parse_or(
                get("PLAYLIST_SEPARATOR_PREFIX"),
                defaults.naming.separator_prefix,
            )?,
            capitalization: parse_or(
                get("PLAYLIST_CAPITALIZATION"),
                defaults.naming.capitalization,
            )?,
            description_template: get("PLAYLIST_DESCRIPTION_TEMPLATE")
                .unwrap_or(defaults.naming.description_template.clone()),
        };

        let mut api = defaults.api.clone();
        if let Some(url) = get("SPOTIFY_API_URL") {
            api.base_url = url.trim_end_matches('/').to_string();
        }
        api.max_retries = parse_number(get("API_MAX_RETRIES"), api.max_retries, "API_MAX_RETRIES")?;

        Ok(Self {
            data_dir: get("ARCHIVIST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            naming,
            enable_monthly: parse_bool(get("PLAYLIST_ENABLE_MONTHLY"), defaults.enable_monthly),
            enable_most_played: parse_bool(
                get("PLAYLIST_ENABLE_MOST_PLAYED"),
                defaults.enable_most_played,
            ),
            enable_discovery: parse_bool(
                get("PLAYLIST_ENABLE_DISCOVERY"),
                defaults.enable_discovery,
            ),
            keep_monthly_months: parse_number(
                get("KEEP_MONTHLY_MONTHS"),
                defaults.keep_monthly_months,
                "KEEP_MONTHLY_MONTHS",
            )?,
            owned_only: parse_bool(get("SYNC_OWNED_ONLY"), defaults.owned_only),
            include_liked_songs: parse_bool(
                get("SYNC_INCLUDE_LIKED_SONGS"),
                defaults.include_liked_songs,
            ),
            enable_health_check: parse_bool(
                get("ENABLE_HEALTH_CHECK"),
                defaults.enable_health_check,
            ),
            enable_insights_report: parse_bool(
                get("ENABLE_INSIGHTS_REPORT"),
                defaults.enable_insights_report,
            ),
            rename_map: get("PLAYLIST_RENAME_MAP")
                .map(|raw| parse_rename_map(&raw))
                .transpose()?
                .unwrap_or_default(),
            history_track_limit: parse_number(
                get("HISTORY_TRACK_LIMIT"),
                defaults.history_track_limit,
                "HISTORY_TRACK_LIMIT",
            )?,
            max_description_length: defaults.max_description_length,
            api,
        })
    }

    /// Playlist kinds switched on in this configuration.
    pub fn enabled_kinds(&self) -> Vec<PlaylistKind> {
        let mut kinds = Vec::new();
        if self.enable_monthly {
            kinds.push(PlaylistKind::Finds);
        }
        if self.enable_most_played {
            kinds.push(PlaylistKind::MostPlayed);
        }
        if self.enable_discovery {
            kinds.push(PlaylistKind::Discovery);
        }
        kinds
    }
}

/// Spotify application credentials and OAuth endpoints.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Refresh token for headless runs without a cached token.
    pub refresh_token: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub server_address: String,
}

impl Credentials {
    /// Reads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `SPOTIFY_API_AUTH_CLIENT_ID` is not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds credentials from an arbitrary key lookup.
    ///
    /// Only `SPOTIFY_API_AUTH_CLIENT_ID` is required; the redirect URI,
    /// scopes, endpoints and `SERVER_ADDRESS` default to the values used by
    /// the local callback server on `127.0.0.1:8888`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the client id is missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get("SPOTIFY_API_AUTH_CLIENT_ID")
            .ok_or_else(|| Error::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string()))?;

        Ok(Self {
            client_id,
            client_secret: get("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            refresh_token: get("SPOTIFY_REFRESH_TOKEN"),
            redirect_uri: get("SPOTIFY_API_REDIRECT_URI")
                .unwrap_or_else(|| "http://127.0.0.1:8888/callback".to_string()),
            scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| {
                "playlist-read-private playlist-read-collaborative playlist-modify-private \
                 playlist-modify-public user-library-read"
                    .to_string()
            }),
            auth_url: get("SPOTIFY_API_AUTH_URL")
                .unwrap_or_else(|| "https://accounts.spotify.com/authorize".to_string()),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| "https://accounts.spotify.com/api/token".to_string()),
            server_address: get("SERVER_ADDRESS").unwrap_or_else(|| "127.0.0.1:8888".to_string()),
        })
    }
}

fn parse_or<T: FromStr<Err = Error>>(raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value.parse(),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_number<T: FromStr>(raw: Option<String>, default: T, key: &str) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'"))),
        None => Ok(default),
    }
}

/// Parses a rename map of the form `Old=>New;Other=>Renamed`.
///
/// Entries are separated by `;`, surrounding whitespace is ignored and empty
/// entries are skipped.
///
/// # Errors
///
/// Returns [`Error::Config`] for an entry without `=>` or with an empty side.
pub fn parse_rename_map(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (from, to) = entry
                .split_once("=>")
                .ok_or_else(|| Error::Config(format!("invalid rename entry '{entry}'")))?;
            let (from, to) = (from.trim(), to.trim());
            if from.is_empty() || to.is_empty() {
                return Err(Error::Config(format!("invalid rename entry '{entry}'")));
            }
            Ok((from.to_string(), to.to_string()))
        })
        .collect()
}
