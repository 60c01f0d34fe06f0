//! # CLI Module
//!
//! Command implementations behind the `archivist` binary. Each command takes
//! the frozen [`Settings`] built by `main`, does its work through the library
//! modules and reports progress with the console macros.
//!
//! ## Commands
//!
//! - [`auth`] - OAuth 2.0 PKCE login, stores the token in the data directory
//! - [`run`] - the step loop: sync, rename, cleanup, consolidation, current
//!   year, descriptions and the optional reports
//! - [`dedupe`] - removes owned playlists with identical content
//! - [`import_history`] - imports an extended streaming history export
//! - [`info`] - health check and insights from the local snapshot
//! - [`list_backups`] / [`restore_backup`] - inspect and restore the backups
//!   written before every deletion
//!
//! ## Layers
//!
//! ```text
//! CLI (this module)
//!     ↓
//! workflow / playlists / sync / reports
//!     ↓
//! management (snapshot store, caches, backups)   spotify (gateway)
//! ```
//!
//! ## Exit Codes
//!
//! Commands return errors instead of exiting. `main` turns configuration and
//! authentication failures into exit code 1; failures of single steps inside
//! `run` are only reported.
//!
//! ## Usage
//!
//! ```bash
//! archivist auth
//! archivist run
//! archivist run --steps sync,consolidate --force
//! archivist history import ~/Downloads/my_spotify_data
//! archivist backups list
//! ```

mod auth;
mod backups;
mod dedupe;
mod history;
mod info;
mod run;

use std::sync::Arc;

pub use auth::auth;
pub use backups::{list_backups, restore_backup};
pub use dedupe::dedupe;
pub use history::import_history;
pub use info::info;
pub use run::run;

use crate::{
    config::{Credentials, Settings},
    error::Result,
    management::TokenManager,
    spotify::{SpotifyClient, SpotifyGateway},
};

/// Authenticated gateway for commands that talk to Spotify.
async fn connect(settings: &Settings) -> Result<Arc<dyn SpotifyGateway>> {
    let credentials = Credentials::from_env()?;
    let tokens = TokenManager::load(&settings.data_dir, credentials).await?;
    let client = SpotifyClient::new(settings.api.clone(), tokens)?;
    Ok(Arc::new(client))
}
