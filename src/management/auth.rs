use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::Credentials,
    error::{Error, Result},
    management::store::write_atomic,
    types::Token,
    verbose,
};

/// Seconds before expiry at which a token is refreshed.
const REFRESH_MARGIN_SECS: u64 = 240;

/// Holds the current OAuth token and refreshes it before it expires.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
    credentials: Credentials,
}

impl TokenManager {
    pub fn new(token: Token, path: impl Into<PathBuf>, credentials: Credentials) -> Self {
        TokenManager {
            token,
            path: path.into(),
            credentials,
        }
    }

    /// Location of the cached token inside the data directory.
    pub fn token_path(data_dir: &Path) -> PathBuf {
        data_dir.join("cache").join("token.json")
    }

    /// Loads the cached token, or bootstraps from `SPOTIFY_REFRESH_TOKEN`
    /// when there is no cache yet.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when neither source is available.
    pub async fn load(data_dir: &Path, credentials: Credentials) -> Result<Self> {
        let path = Self::token_path(data_dir);
        match async_fs::read_to_string(&path).await {
            Ok(content) => {
                let token: Token = serde_json::from_str(&content)?;
                Ok(Self::new(token, path, credentials))
            }
            Err(_) => match credentials.refresh_token.clone() {
                Some(refresh_token) => {
                    let token = Token {
                        access_token: String::new(),
                        refresh_token,
                        scope: credentials.scope.clone(),
                        expires_in: 0,
                        obtained_at: 0,
                    };
                    Ok(Self::new(token, path, credentials))
                }
                None => Err(Error::Auth(
                    "no cached token found, run `archivist auth` first".to_string(),
                )),
            },
        }
    }

    pub async fn persist(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.token)?;
        write_atomic(&self.path, &json).await
    }

    /// Returns an access token, refreshing and persisting it first if needed.
    pub async fn get_valid_token(&mut self) -> Result<String> {
        if self.is_expired() {
            verbose!("Refreshing access token");
            self.token = refresh_token(&self.credentials, &self.token.refresh_token).await?;
            self.persist().await?;
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        self.token.access_token.is_empty()
            || now + REFRESH_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

/// Exchanges a refresh token for a new access token.
///
/// Spotify may omit `refresh_token` in the response, in which case the old
/// one stays valid.
pub async fn refresh_token(credentials: &Credentials, refresh_token: &str) -> Result<Token> {
    let client = Client::new();
    let mut request = client.post(&credentials.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", credentials.client_id.as_str()),
    ]);
    if let Some(secret) = &credentials.client_secret {
        request = request.basic_auth(&credentials.client_id, Some(secret));
    }

    let res = request.send().await?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(Error::Auth(format!("token refresh failed ({status}): {body}")));
    }

    let json: Value = res.json().await?;
    token_from_json(&json, Some(refresh_token))
}

/// Builds a [`Token`] from a token endpoint response.
pub fn token_from_json(json: &Value, previous_refresh: Option<&str>) -> Result<Token> {
    let access_token = json["access_token"]
        .as_str()
        .ok_or_else(|| Error::Auth("token response without access_token".to_string()))?;
    let refresh_token = json["refresh_token"]
        .as_str()
        .or(previous_refresh)
        .ok_or_else(|| Error::Auth("token response without refresh_token".to_string()))?;

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}
