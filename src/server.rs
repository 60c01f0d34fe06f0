use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    api,
    config::Credentials,
    error::{Error, Result},
    types::PkceToken,
};

/// Routes of the local auth server. `/callback` extracts both the shared
/// PKCE state and the credentials.
pub fn router(state: Arc<Mutex<Option<PkceToken>>>, credentials: Arc<Credentials>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(credentials))
}

/// Serves `/health` and `/callback` until the process exits.
pub async fn start_api_server(
    state: Arc<Mutex<Option<PkceToken>>>,
    credentials: Arc<Credentials>,
) -> Result<()> {
    let app = router(state, Arc::clone(&credentials));

    let addr = SocketAddr::from_str(&credentials.server_address).map_err(|e| {
        Error::Config(format!(
            "invalid SERVER_ADDRESS '{}': {}",
            credentials.server_address, e
        ))
    })?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
