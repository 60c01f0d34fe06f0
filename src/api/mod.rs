//! # API Module
//!
//! HTTP endpoints of the short-lived local server used during `archivist auth`.
//!
//! - [`callback`] - OAuth redirect target; completes the PKCE flow by
//!   exchanging the authorization code for a token.
//! - [`health`] - liveness probe returning name and version.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use archivist::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
