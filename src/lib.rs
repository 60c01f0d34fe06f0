//! Archivist Library
//!
//! Keeps a local snapshot of a Spotify library (playlists, tracks, artists,
//! memberships and streaming history) and maintains a set of archive playlists
//! on top of it: monthly "Finds" playlists for recent months, yearly archives
//! for everything older, plus most-played and discovery playlists derived from
//! streaming history.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command implementations behind the binary
//! - `config` - Settings and credentials loaded from the environment
//! - `error` - Crate error type
//! - `management` - Local persistence: snapshot tables, marker caches, backups, tokens
//! - `playlists` - Naming, reconciliation, safe deletion and descriptions
//! - `reports` - Health check and insights computed from the snapshot
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API gateway
//! - `steps` - Step selection for a run
//! - `sync` - Incremental library sync and streaming history import
//! - `types` - Wire types and snapshot rows
//! - `utils` - PKCE helpers and small utilities
//! - `workflow` - The step loop driving a full run

use std::sync::atomic::{AtomicBool, Ordering};

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod playlists;
pub mod reports;
pub mod server;
pub mod spotify;
pub mod steps;
pub mod sync;
pub mod types;
pub mod utils;
pub mod workflow;

pub use error::{Error, Result};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Turns output of the [`verbose!`] macro on or off for the whole process.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching playlists...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for fatal startup failures (missing credentials, failed
/// authentication). Anything recoverable goes through [`warning!`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems: a failed step, a skipped deletion, a cache
/// file that had to be discarded.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a dimmed detail line, only when verbose mode is enabled.
///
/// # Example
///
/// ```
/// archivist::set_verbose(true);
/// verbose!("Adding chunk {} ({} tracks)", n, chunk.len());
/// ```
#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => ({
    if $crate::is_verbose() {
      use colored::Colorize;
      println!("[{}] {}", "·".dimmed(), std::format_args!($($arg)*));
    }
  })
}
