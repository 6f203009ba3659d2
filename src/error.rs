//! Error taxonomy for session management, fetching and mapping.

use thiserror::Error;

/// Errors surfaced by the authentication flow, the API client, the
/// paginated fetcher and the domain mapper.
///
/// Callers inspect the variant to decide whether to re-authenticate
/// (`AuthenticationRequired`), retry later (`RateLimitExhausted`,
/// `TransientNetworkFailure`), or skip a record (`MappingError`).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No valid session and no way to renew one. The user has to run the
    /// authorization flow again.
    #[error("authentication required: no valid or refreshable session")]
    AuthenticationRequired,

    /// The `state` parameter returned on the OAuth callback did not match
    /// the one generated for this authorization attempt.
    #[error("state parameter mismatch on OAuth callback (possible CSRF)")]
    CsrfValidationFailed,

    /// The token endpoint rejected a code exchange. The raw error payload
    /// is retained for diagnostics.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Another authorization flow is already awaiting its callback.
    #[error("an authorization flow is already in progress")]
    FlowAlreadyPending,

    /// No callback arrived within the flow's wait window.
    #[error("timed out waiting for the OAuth callback")]
    CallbackTimeout,

    /// The retry budget was spent on rate-limit responses. Try again later.
    #[error("rate limit budget exhausted after {attempts} attempts; try again later")]
    RateLimitExhausted { attempts: u32 },

    /// Retries on 5xx responses or connection failures were exhausted.
    #[error("transient network failure: {0}")]
    TransientNetworkFailure(String),

    /// A non-retryable client error (4xx other than 401/429).
    #[error("request failed with status {status}: {body}")]
    PermanentRequestError { status: u16, body: String },

    /// One page of a paginated fetch failed after exhausting retries.
    /// Records gathered from earlier pages are preserved in `partial`.
    #[error("page fetch failed at offset {offset} ({retained} records retained)", retained = partial.len())]
    PageFetchFailed {
        offset: u64,
        partial: Vec<serde_json::Value>,
        #[source]
        source: Box<ServiceError>,
    },

    /// A raw record could not be mapped into the normalized model. Carries
    /// the offending record id so the caller may skip-and-log it.
    #[error("cannot map record {record}: {detail}")]
    MappingError { record: String, detail: String },

    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed JSON in an API response or the persisted session file.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Session persistence failure.
    #[error("session storage failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Retries on timeouts, connection failures, rate limiting and server
    /// errors (5xx). Does NOT retry on client errors or mapping failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::RateLimitExhausted { .. } | ServiceError::TransientNetworkFailure(_) => {
                true
            }
            ServiceError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            _ => false,
        }
    }

    /// Whether the caller should start a new authorization flow.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            ServiceError::AuthenticationRequired | ServiceError::TokenExchange(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(ServiceError::TransientNetworkFailure("502".into()).is_retryable());
        assert!(ServiceError::RateLimitExhausted { attempts: 3 }.is_retryable());
        assert!(!ServiceError::AuthenticationRequired.is_retryable());
        assert!(!ServiceError::CsrfValidationFailed.is_retryable());
        assert!(
            !ServiceError::MappingError {
                record: "abc".into(),
                detail: "missing name".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_needs_reauth() {
        assert!(ServiceError::AuthenticationRequired.needs_reauth());
        assert!(ServiceError::TokenExchange("invalid_grant".into()).needs_reauth());
        assert!(!ServiceError::CallbackTimeout.needs_reauth());
    }

    #[test]
    fn test_page_fetch_failed_reports_retained_count() {
        let err = ServiceError::PageFetchFailed {
            offset: 300,
            partial: vec![serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})],
            source: Box::new(ServiceError::RateLimitExhausted { attempts: 3 }),
        };
        let msg = err.to_string();
        assert!(msg.contains("offset 300"));
        assert!(msg.contains("2 records"));
    }
}
