//! # Spotify Integration Module
//!
//! Everything that talks to the Spotify Web API.
//!
//! ## Layout
//!
//! ```text
//! sync / playlists
//!          ↓
//! SpotifyGateway (trait)      paging helpers
//!          ↓
//! SpotifyClient (reqwest, retry/backoff, TokenManager)
//!          ↓
//! Spotify Web API
//! ```
//!
//! - [`gateway`] - the capability the rest of the crate depends on. Tests
//!   substitute an in-memory implementation.
//! - [`client`] - the HTTP implementation. Rate limits (429) honour
//!   `Retry-After`; 5xx and network failures back off exponentially up to the
//!   configured retry ceiling.
//! - [`paging`] - collect-all helpers over offset pagination and batched
//!   track additions.
//! - [`auth`] - OAuth 2.0 PKCE flow with a local callback server.
//!
//! ## API Coverage
//!
//! - `GET /me`, `GET /me/playlists`, `GET /me/tracks`
//! - `GET /playlists/{id}`, `GET /playlists/{id}/tracks`
//! - `GET /artists?ids=`
//! - `POST /users/{user_id}/playlists`, `POST /playlists/{id}/tracks`
//! - `PUT /playlists/{id}`
//! - `DELETE /playlists/{id}/followers`
//! - `POST /api/token`

pub mod auth;
pub mod client;
pub mod gateway;
pub mod paging;

pub use client::SpotifyClient;
pub use gateway::SpotifyGateway;
