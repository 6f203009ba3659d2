use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use wiremock::matchers::{method, path};

use spexport::error::ServiceError;
use spexport::management::TokenStore;
use spexport::spotify::client::SpotifyClient;
use spexport::spotify::pager::Paginator;
use spexport::types::Session;

/// Serves a synthetic collection of `total` records in pages, driven by the
/// request's `offset` and `limit` query parameters. Optionally fails every
/// request at one offset with a 500.
struct PagedResponder {
    total: u64,
    fail_at_offset: Option<u64>,
    advertise_extra_next: bool,
}

impl Respond for PagedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query: Vec<(String, String)> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let get = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<u64>().ok())
        };
        let offset = get("offset").unwrap_or(0);
        let limit = get("limit").unwrap_or(50);

        if self.fail_at_offset == Some(offset) {
            return ResponseTemplate::new(500);
        }

        let end = (offset + limit).min(self.total);
        let items: Vec<Value> = (offset..end)
            .map(|i| json!({"id": format!("item_{i}")}))
            .collect();
        let next = if end < self.total || self.advertise_extra_next {
            json!(format!("https://example.com/page?offset={end}"))
        } else {
            Value::Null
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "items": items,
            "total": self.total,
            "next": next,
            "offset": offset,
        }))
    }
}

fn session() -> Session {
    Session {
        access_token: "valid".to_string(),
        refresh_token: None,
        scope: "playlist-read-private".to_string(),
        expires_at: Utc::now().timestamp() + 3600,
    }
}

async fn client(server: &MockServer) -> (TempDir, SpotifyClient) {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));
    let client = SpotifyClient::new(
        server.uri(),
        format!("{}/api/token", server.uri()),
        "client_id",
        "client_secret",
        session(),
        store,
    )
    .unwrap();
    (dir, client)
}

async fn mount(server: &MockServer, responder: PagedResponder) {
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(responder)
        .mount(server)
        .await;
}

fn ids(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_single_page_collection() {
    let server = MockServer::start().await;
    mount(
        &server,
        PagedResponder {
            total: 5,
            fail_at_offset: None,
            advertise_extra_next: false,
        },
    )
    .await;
    let (_dir, client) = client(&server).await;

    let mut pager = Paginator::new(&client, "/me/playlists", 50);
    let records = pager.fetch_all().await.unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(ids(&records)[0], "item_0");
    assert_eq!(pager.total(), Some(5));
}

#[tokio::test]
async fn test_multi_page_collection_is_ordered_and_complete() {
    let server = MockServer::start().await;
    mount(
        &server,
        PagedResponder {
            total: 100,
            fail_at_offset: None,
            advertise_extra_next: false,
        },
    )
    .await;
    let (_dir, client) = client(&server).await;

    let mut pager = Paginator::new(&client, "/me/playlists", 10);
    let records = pager.fetch_all().await.unwrap();

    // Every record exactly once, in source order; no offset requested twice.
    let ids = ids(&records);
    assert_eq!(ids.len(), 100);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id, &format!("item_{i}"));
    }
}

#[tokio::test]
async fn test_thousand_page_collection() {
    let server = MockServer::start().await;
    mount(
        &server,
        PagedResponder {
            total: 1000,
            fail_at_offset: None,
            advertise_extra_next: false,
        },
    )
    .await;
    let (_dir, client) = client(&server).await;

    // One record per page, so the walk issues a thousand page requests.
    let mut pager = Paginator::new(&client, "/me/playlists", 1);
    let records = pager.fetch_all().await.unwrap();

    assert_eq!(records.len(), 1000);
    assert_eq!(records.last().unwrap()["id"], "item_999");
}

#[tokio::test]
async fn test_page_failure_preserves_partial_results() {
    let server = MockServer::start().await;
    mount(
        &server,
        PagedResponder {
            total: 500,
            fail_at_offset: Some(300),
            advertise_extra_next: false,
        },
    )
    .await;
    let (_dir, client) = client(&server).await;

    // No retry budget so the 500 fails the page immediately.
    let mut pager = Paginator::new(&client.with_max_retries(0), "/me/playlists", 50);
    let err = pager.fetch_all().await.unwrap_err();

    match err {
        ServiceError::PageFetchFailed {
            offset,
            partial,
            source,
        } => {
            assert_eq!(offset, 300);
            // Pages 0..6 were consumed before the failure.
            assert_eq!(partial.len(), 300);
            assert_eq!(partial.last().unwrap()["id"], "item_299");
            assert!(matches!(*source, ServiceError::TransientNetworkFailure(_)));
        }
        other => panic!("expected PageFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_next_with_larger_total_stops_gracefully() {
    let server = MockServer::start().await;

    // One page of 50 with no next link, but a reported total of 100.
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": (0..50).map(|i| json!({"id": format!("item_{i}")})).collect::<Vec<_>>(),
            "total": 100,
            "next": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, client) = client(&server).await;
    let mut pager = Paginator::new(&client, "/me/playlists", 50);
    let records = pager.fetch_all().await.unwrap();

    // The walk stops rather than re-requesting or failing.
    assert_eq!(records.len(), 50);
}

#[tokio::test]
async fn test_next_advertised_beyond_total_stops_at_total() {
    let server = MockServer::start().await;
    mount(
        &server,
        PagedResponder {
            total: 50,
            fail_at_offset: None,
            advertise_extra_next: true,
        },
    )
    .await;
    let (_dir, client) = client(&server).await;

    let mut pager = Paginator::new(&client, "/me/playlists", 50);
    let records = pager.fetch_all().await.unwrap();

    assert_eq!(records.len(), 50);
}
