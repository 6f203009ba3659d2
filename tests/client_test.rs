use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spexport::error::ServiceError;
use spexport::management::TokenStore;
use spexport::spotify::client::SpotifyClient;
use spexport::types::Session;

// Helper to create a session expiring `in_secs` seconds from now.
fn session(access: &str, refresh: Option<&str>, in_secs: i64) -> Session {
    Session {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        scope: "playlist-read-private playlist-read-collaborative".to_string(),
        expires_at: Utc::now().timestamp() + in_secs,
    }
}

fn client(server: &MockServer, session: Session, store: TokenStore) -> SpotifyClient {
    SpotifyClient::new(
        server.uri(),
        format!("{}/api/token", server.uri()),
        "client_id",
        "client_secret",
        session,
        store,
    )
    .unwrap()
}

fn temp_store() -> (TempDir, TokenStore) {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));
    (dir, store)
}

#[tokio::test]
async fn test_valid_session_is_used_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_1"})))
        .expect(1)
        .mount(&server)
        .await;

    // The token endpoint must never be called for an unexpired session.
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("valid", Some("refresh"), 3600), store);

    let body = client.get("/me", &[]).await.unwrap();
    assert_eq!(body["id"], "user_1");
}

#[tokio::test]
async fn test_concurrent_requests_trigger_exactly_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "playlist-read-private"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_1"})))
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("stale", Some("refresh"), 0), store);

    // Both callers observe the expired session; only one refresh may happen.
    let (a, b) = tokio::join!(client.get("/me", &[]), client.get("/me", &[]));
    assert!(a.is_ok());
    assert!(b.is_ok());

    let session = client.session().await;
    assert_eq!(session.access_token, "fresh");
    // Refresh responses without a refresh token keep the previous one.
    assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after_then_exhausts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client =
        client(&server, session("valid", Some("refresh"), 3600), store).with_max_retries(2);

    let start = Instant::now();
    let err = client.get("/me/playlists", &[]).await.unwrap_err();

    // Two waits of one second each before the budget runs out.
    assert!(start.elapsed().as_millis() >= 2000);
    assert!(matches!(
        err,
        ServiceError::RateLimitExhausted { attempts: 3 }
    ));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlists/nope/tracks"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("valid", Some("refresh"), 3600), store);

    let err = client.get("/playlists/nope/tracks", &[]).await.unwrap_err();
    match err {
        ServiceError::PermanentRequestError { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected PermanentRequestError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_1"})))
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("valid", Some("refresh"), 3600), store);

    let body = client.get("/me", &[]).await.unwrap();
    assert_eq!(body["id"], "user_1");
}

#[tokio::test]
async fn test_invalid_grant_clears_store_and_requires_reauth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "invalid_grant", "error_description": "revoked"})),
        )
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let expired = session("stale", Some("revoked_refresh"), 0);
    store.save(&expired).await.unwrap();

    let client = client(&server, expired, store.clone());
    let err = client.get("/me", &[]).await.unwrap_err();

    assert!(matches!(err, ServiceError::AuthenticationRequired));
    assert!(err.needs_reauth());
    // The dead session must not survive on disk.
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_session_without_refresh_token_requires_reauth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("stale", None, 0), store);

    let err = client.get("/me", &[]).await.unwrap_err();
    assert!(matches!(err, ServiceError::AuthenticationRequired));
}

#[tokio::test]
async fn test_refreshed_session_is_persisted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "playlist-read-private"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user_1"})))
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let client = client(&server, session("stale", Some("refresh"), 0), store.clone());

    client.get("/me", &[]).await.unwrap();

    let persisted = store.load().await.unwrap().unwrap();
    assert_eq!(persisted.access_token, "fresh");
    assert!(!persisted.is_expired());
}

#[tokio::test]
async fn test_debug_redacts_client_secret() {
    let (_dir, store) = temp_store();
    let client = SpotifyClient::new(
        "https://api.example.com",
        "https://accounts.example.com/api/token",
        "client_id",
        "super_secret_value",
        session("valid", None, 3600),
        store,
    )
    .unwrap();

    let debug_str = format!("{:?}", client);
    assert!(!debug_str.contains("super_secret_value"), "{debug_str}");
    assert!(debug_str.contains("[REDACTED]"));
}
