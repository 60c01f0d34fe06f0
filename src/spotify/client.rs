use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::ApiSettings,
    error::{Error, Result},
    management::TokenManager,
    spotify::SpotifyGateway,
    types::{
        AddTracksRequest, ArtistsResponse, ChangeDetailsRequest, CreatePlaylistRequest,
        FullArtist, Page, PlaylistItem, PlaylistMeta, SavedTrack, SimplifiedPlaylist,
        SnapshotResponse, User,
    },
    verbose, warning,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`SpotifyGateway`] backed by the Spotify Web API.
///
/// Every request goes through [`SpotifyClient::send`], which retries rate
/// limited (429), server side (5xx) and network failures with exponential
/// backoff until `max_retries` attempts have been made.
pub struct SpotifyClient {
    http: Client,
    api: ApiSettings,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    /// Builds a client around an HTTP connection pool with a request timeout.
    ///
    /// # Arguments
    ///
    /// * `api` - Base URL and retry policy (`max_retries`, backoff bounds and
    ///   the longest `Retry-After` wait that is honoured)
    /// * `tokens` - Token manager; the access token is refreshed on demand
    ///   before each request
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] when the underlying `reqwest` client cannot be
    /// built (for example when no TLS backend is available).
    pub fn new(api: ApiSettings, tokens: TokenManager) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api,
            tokens: Mutex::new(tokens),
        })
    }

    /// Sends one API request, retrying transient failures.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `path` - Path below the API base URL, e.g. `/me/playlists`
    /// * `query` - Query parameters
    /// * `body` - Optional JSON body
    ///
    /// # Retry Policy
    ///
    /// - **429**: waits for `Retry-After` when present (capped at
    ///   `max_retry_after`), otherwise for the exponential backoff
    /// - **5xx, timeouts, connection errors**: exponential backoff starting
    ///   at `initial_backoff`, capped at `max_backoff`
    /// - **other statuses**: returned immediately through [`status_error`]
    ///
    /// # Returns
    ///
    /// The successful response, body unread.
    ///
    /// # Errors
    ///
    /// - [`Error::RetriesExhausted`] after `max_retries` attempts
    /// - [`Error::NotFound`], [`Error::Validation`], [`Error::Auth`] or
    ///   [`Error::Api`] for non-retryable statuses
    /// - token refresh failures from [`TokenManager::get_valid_token`]
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.api.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let token = self.tokens.lock().await.get_valid_token().await?;

            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .query(query);
            if let Some(body) = &body {
                request = request.json(body);
            }

            let delay = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let header = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok());
                        let wait = parse_retry_after(header).unwrap_or_else(|| {
                            retry_delay(attempt, self.api.initial_backoff, self.api.max_backoff)
                        });
                        if wait > self.api.max_retry_after {
                            warning!(
                                "Rate limit asks to wait {}s, waiting {}s instead",
                                wait.as_secs(),
                                self.api.max_retry_after.as_secs()
                            );
                        }
                        wait.min(self.api.max_retry_after)
                    } else if status.is_server_error() {
                        retry_delay(attempt, self.api.initial_backoff, self.api.max_backoff)
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(status_error(status, &body));
                    }
                }
                Err(err) if err.is_timeout() || err.is_connect() => {
                    retry_delay(attempt, self.api.initial_backoff, self.api.max_backoff)
                }
                Err(err) => return Err(err.into()),
            };

            if attempt >= self.api.max_retries {
                return Err(Error::RetriesExhausted { attempts: attempt });
            }

            verbose!(
                "{} {} failed, retry {}/{} in {}ms",
                method,
                path,
                attempt,
                self.api.max_retries,
                delay.as_millis()
            );
            sleep(delay).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SpotifyGateway for SpotifyClient {
    async fn current_user(&self) -> Result<User> {
        self.get_json("/me", &[]).await
    }

    async fn playlists_page(&self, offset: u32, limit: u32) -> Result<Page<SimplifiedPlaylist>> {
        self.get_json(
            "/me/playlists",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistMeta> {
        self.get_json(
            &format!("/playlists/{playlist_id}"),
            &[(
                "fields",
                "id,name,description,snapshot_id,owner(id,display_name)".to_string(),
            )],
        )
        .await
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<PlaylistItem>> {
        self.get_json(
            &format!("/playlists/{playlist_id}/tracks"),
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("additional_types", "track".to_string()),
            ],
        )
        .await
    }

    async fn liked_songs_page(&self, offset: u32, limit: u32) -> Result<Page<SavedTrack>> {
        self.get_json(
            "/me/tracks",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<FullArtist>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let res: ArtistsResponse = self.get_json("/artists", &[("ids", ids.join(","))]).await?;
        Ok(res.artists.into_iter().flatten().collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistMeta> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public,
            collaborative: false,
        };
        let response = self
            .send(
                Method::POST,
                &format!("/users/{user_id}/playlists"),
                &[],
                Some(serde_json::to_value(body)?),
            )
            .await?;
        Ok(response.json::<PlaylistMeta>().await?)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<String> {
        let body = AddTracksRequest {
            uris: uris.to_vec(),
        };
        let response = self
            .send(
                Method::POST,
                &format!("/playlists/{playlist_id}/tracks"),
                &[],
                Some(serde_json::to_value(body)?),
            )
            .await?;
        Ok(response.json::<SnapshotResponse>().await?.snapshot_id)
    }

    async fn change_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let body = ChangeDetailsRequest {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
        };
        self.send(
            Method::PUT,
            &format!("/playlists/{playlist_id}"),
            &[],
            Some(serde_json::to_value(body)?),
        )
        .await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &format!("/playlists/{playlist_id}/followers"),
            &[],
            Some(json!({})),
        )
        .await?;
        Ok(())
    }
}

/// Computes the backoff before retry number `attempt`.
///
/// # Arguments
///
/// * `attempt` - 1-based number of the attempt that just failed
/// * `initial` - Delay after the first failure
/// * `max` - Upper bound for any delay
///
/// # Returns
///
/// `initial * 2^(attempt-1)`, capped at `max`. Overflow saturates to `max`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// let d = retry_delay(3, Duration::from_secs(1), Duration::from_secs(60));
/// assert_eq!(d, Duration::from_secs(4));
/// ```
pub fn retry_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    initial.saturating_mul(factor).min(max)
}

/// Parses a `Retry-After` header value.
///
/// Spotify sends the wait in whole seconds. HTTP-date values and garbage
/// yield `None`, in which case the caller falls back to its own backoff.
pub fn parse_retry_after(header: Option<&str>) -> Option<Duration> {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps a non-retryable status to the crate error.
///
/// # Arguments
///
/// * `status` - Response status
/// * `body` - Raw response body; when it is a Spotify error object
///   (`{"error": {"status": .., "message": ..}}`) its message is used,
///   otherwise the trimmed body
///
/// # Returns
///
/// | status | error |
/// |---|---|
/// | 404 | [`Error::NotFound`] |
/// | 400 | [`Error::Validation`] (e.g. a rejected description) |
/// | 401 | [`Error::Auth`] |
/// | anything else | [`Error::Api`] with the numeric status |
pub fn status_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST => Error::Validation(message),
        StatusCode::UNAUTHORIZED => Error::Auth(message),
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}
