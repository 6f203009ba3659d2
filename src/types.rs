use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::Mutex;

/// Safety buffer subtracted from the expiry timestamp so a token is
/// refreshed shortly before the server would start rejecting it.
pub const EXPIRY_BUFFER_SECS: i64 = 300;

/// An authenticated session with the remote API.
///
/// `expires_at` is an absolute unix timestamp. A session with a refresh
/// token is renewable even after expiry; without one, expiry is terminal
/// and re-authorization is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: String,
    pub expires_at: i64,
}

impl Session {
    /// Whether the access token is expired (with a safety buffer).
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at - EXPIRY_BUFFER_SECS
    }

    /// Whether an expired session can still be renewed.
    pub fn is_renewable(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// The granted scopes as individual strings.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }

    /// Builds a session from a token endpoint response.
    ///
    /// Refresh responses may omit the refresh token; in that case the
    /// previous one is carried over so the session stays renewable.
    pub fn from_token_response(res: TokenResponse, previous_refresh: Option<String>) -> Self {
        Session {
            access_token: res.access_token,
            refresh_token: res.refresh_token.or(previous_refresh),
            scope: res.scope.unwrap_or_default(),
            expires_at: Utc::now().timestamp() + res.expires_in,
        }
    }
}

/// Wire format of the OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: i64,
}

/// Reason an authorization attempt failed before producing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The callback's `state` parameter did not match the generated one.
    StateMismatch,
    /// The authorization server redirected back with an error.
    Provider(String),
    /// The code-for-token exchange was rejected; raw payload retained.
    Exchange(String),
}

/// A single in-flight authorization attempt.
///
/// Created when the flow starts awaiting its callback; the callback handler
/// records the outcome exactly once. Only one attempt may be pending per
/// process.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    /// Random single-use state token checked for exact match on callback.
    pub state: String,
    pub outcome: Option<Result<Session, AuthFailure>>,
}

impl AuthAttempt {
    pub fn new(state: String) -> Self {
        AuthAttempt {
            state,
            outcome: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// State shared between the auth flow and the callback handler.
pub type SharedAuthState = Arc<Mutex<Option<AuthAttempt>>>;

/// Wire format of one page of a paginated collection.
///
/// Spotify reports both a `total` count and a `next` link; the paginator
/// treats disagreement between the two as a soft stop.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub owner: String,
    pub kind: String,
    pub tracks: String,
    pub duration: String,
    pub visibility: String,
}

#[derive(Tabled)]
pub struct ProfileTableRow {
    pub field: String,
    pub value: String,
}
