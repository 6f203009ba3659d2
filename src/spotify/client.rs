use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::{
    Res, config,
    error::ServiceError,
    management::TokenStore,
    types::{Session, TokenResponse},
    utils,
};

/// Total request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of retry attempts for rate-limit and transient failures.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Builds the HTTP client shared by the API and token endpoint paths.
/// Every request carries bounded timeouts; no call may block indefinitely.
pub(crate) fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
}

/// Authenticated Spotify Web API client.
///
/// Issues bearer-authenticated requests against the API, transparently
/// refreshing an expired session and applying a bounded retry/backoff
/// policy for rate-limit and transient server failures.
///
/// The session is the only shared mutable state. Readers take a snapshot
/// of the access token per request; the refresh path holds the session
/// lock exclusively, and a double-check after acquiring it lets concurrent
/// callers that observed the same expired token reuse one refresh outcome
/// instead of triggering duplicates.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    session: Arc<Mutex<Session>>,
    store: TokenStore,
    max_retries: u32,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl SpotifyClient {
    /// Creates a client with explicit endpoints and credentials.
    pub fn new(
        api_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        session: Session,
        store: TokenStore,
    ) -> Res<Self> {
        let http = http_client()?;

        Ok(SpotifyClient {
            http,
            api_url: api_url.into(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            session: Arc::new(Mutex::new(session)),
            store,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Creates a client from the environment configuration.
    pub fn from_config(session: Session, store: TokenStore) -> Res<Self> {
        SpotifyClient::new(
            config::api_url(),
            config::token_url(),
            config::client_id(),
            config::client_secret(),
            session,
            store,
        )
    }

    /// Overrides the retry budget. Used by tests to keep backoff short.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// A snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Issues an authenticated GET request for `path` (relative to the API
    /// base URL) and returns the parsed JSON body.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Res<serde_json::Value> {
        self.request(Method::GET, path, query).await
    }

    /// Issues an authenticated request and returns the parsed JSON body.
    ///
    /// Failure policy, bounded by the retry budget:
    /// - 401: refresh the session once and retry the original request with
    ///   the new credential; if the refresh fails, surface
    ///   [`ServiceError::AuthenticationRequired`].
    /// - 429: wait for the server's `Retry-After` hint when present,
    ///   otherwise exponential backoff with jitter; budget exhaustion
    ///   surfaces [`ServiceError::RateLimitExhausted`].
    /// - 5xx and connection failures: bounded exponential backoff, then
    ///   [`ServiceError::TransientNetworkFailure`].
    /// - other 4xx: [`ServiceError::PermanentRequestError`] immediately,
    ///   these are not transient.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Res<serde_json::Value> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt: u32 = 0;
        let mut refreshed = false;

        loop {
            let token = self.bearer().await?;
            let result = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .query(query)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt >= self.max_retries {
                        return Err(ServiceError::TransientNetworkFailure(e.to_string()));
                    }
                    attempt += 1;
                    sleep(utils::backoff_delay(attempt)).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                if refreshed {
                    return Err(ServiceError::AuthenticationRequired);
                }
                refreshed = true;
                self.refresh_after_unauthorized(&token).await?;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(ServiceError::RateLimitExhausted {
                        attempts: attempt + 1,
                    });
                }
                attempt += 1;
                let wait = retry_after_hint(&response)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| utils::backoff_delay(attempt));
                sleep(wait).await;
                continue;
            }

            if status.is_server_error() {
                if attempt >= self.max_retries {
                    return Err(ServiceError::TransientNetworkFailure(format!(
                        "server error {status} persisted after {attempt} retries"
                    )));
                }
                attempt += 1;
                sleep(utils::backoff_delay(attempt)).await;
                continue;
            }

            if status.is_client_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(ServiceError::PermanentRequestError {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response.json::<serde_json::Value>().await?);
        }
    }

    /// Returns a valid access token, refreshing the session first if it has
    /// expired. Concurrent callers serialize on the session lock; whoever
    /// arrives after a refresh finds a fresh session and skips its own.
    async fn bearer(&self) -> Res<String> {
        let mut session = self.session.lock().await;
        if session.is_expired() {
            if !session.is_renewable() {
                return Err(ServiceError::AuthenticationRequired);
            }
            self.refresh_locked(&mut session).await?;
        }
        Ok(session.access_token.clone())
    }

    /// Refresh path for a 401 on a token the server rejected. Skips the
    /// refresh when another caller already replaced the stale token.
    async fn refresh_after_unauthorized(&self, stale_token: &str) -> Res<()> {
        let mut session = self.session.lock().await;
        if session.access_token != stale_token {
            return Ok(());
        }
        if !session.is_renewable() {
            return Err(ServiceError::AuthenticationRequired);
        }
        self.refresh_locked(&mut session).await
    }

    /// Exchanges the refresh token for a new session and persists it.
    /// Caller must hold the session lock.
    async fn refresh_locked(&self, session: &mut Session) -> Res<()> {
        let refresh_token = session
            .refresh_token
            .clone()
            .ok_or(ServiceError::AuthenticationRequired)?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("invalid_grant") {
                // The grant was revoked; the persisted session is dead.
                self.store.clear().await?;
            }
            return Err(ServiceError::AuthenticationRequired);
        }

        let token: TokenResponse = serde_json::from_value(response.json().await?)?;
        *session = Session::from_token_response(token, Some(refresh_token));
        self.store.save(session).await?;
        Ok(())
    }
}

/// Reads the `Retry-After` wait hint (in seconds) from a 429 response.
fn retry_after_hint(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
