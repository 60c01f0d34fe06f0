use std::{path::Path, sync::Arc, time::Duration};

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::Credentials,
    error::{Error, Result},
    management::{TokenManager, token_from_json},
    server::start_api_server,
    success,
    types::{PkceToken, Token},
    utils, warning,
};

const MAX_WAIT: Duration = Duration::from_secs(120);

/// Runs the OAuth 2.0 authorization code flow with PKCE and stores the token.
///
/// # Arguments
///
/// * `credentials` - Client id, redirect URI, scopes and the endpoints to use
/// * `data_dir` - Directory the token file is written to
/// * `shared_state` - State shared with the `/callback` handler; it receives
///   the code verifier here and hands the exchanged token back
///
/// # Authentication Flow
///
/// 1. **PKCE Setup**: generates a random code verifier and its SHA256 challenge
/// 2. **Server Start**: spawns the local callback server on `SERVER_ADDRESS`
/// 3. **Browser Launch**: opens the authorization URL, or prints it when no
///    browser can be started
/// 4. **Callback**: the handler exchanges the code for a token
/// 5. **Persistence**: the token is saved through [`TokenManager`]
///
/// # Errors
///
/// - [`Error::Auth`] when no token arrives within two minutes
/// - IO or serialization errors while writing the token file
pub async fn auth(
    credentials: Credentials,
    data_dir: &Path,
    shared_state: Arc<Mutex<Option<PkceToken>>>,
) -> Result<()> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let server_state = Arc::clone(&shared_state);
    let server_credentials = Arc::new(credentials.clone());
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, server_credentials).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = format!(
        "{spotify_auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        spotify_auth_url = credentials.auth_url,
        client_id = credentials.client_id,
        redirect_uri = credentials.redirect_uri,
        code_challenge = code_challenge,
        scope = credentials.scope.replace(' ', "%20"),
    );

    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier: code_verifier.clone(),
            token: None,
        });
    }

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state)
        .await
        .ok_or_else(|| Error::Auth("authentication failed or timed out".to_string()))?;

    let token_manager =
        TokenManager::new(token, TokenManager::token_path(data_dir), credentials);
    token_manager.persist().await?;

    success!("Authentication successful!");
    Ok(())
}

/// Polls the shared state once per second until the callback has stored a
/// token or [`MAX_WAIT`] has passed.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < MAX_WAIT {
        let lock = shared_state.lock().await;
        if let Some(pkce_token) = lock.as_ref() {
            if let Some(token) = &pkce_token.token {
                return Some(token.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges an authorization code for a token.
///
/// # Arguments
///
/// * `credentials` - Supplies the token endpoint, client id and redirect URI
/// * `code` - Authorization code from the callback query
/// * `verifier` - PKCE code verifier generated when the flow started
///
/// # Returns
///
/// The new token, stamped with the time it was obtained.
///
/// # Errors
///
/// Returns [`Error::Auth`] with the response body when the endpoint rejects
/// the exchange, and [`Error::Http`] on transport failures.
pub async fn exchange_code_pkce(
    credentials: &Credentials,
    code: &str,
    verifier: &str,
) -> Result<Token> {
    let client = Client::new();
    let res = client
        .post(&credentials.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(Error::Auth(format!("code exchange failed ({status}): {body}")));
    }

    let json: Value = res.json().await?;
    token_from_json(&json, None)
}
