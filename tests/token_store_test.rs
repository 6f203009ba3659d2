use chrono::Utc;
use tempfile::TempDir;

use spexport::management::TokenStore;
use spexport::types::Session;

fn session() -> Session {
    Session {
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        scope: "playlist-read-private playlist-read-collaborative".to_string(),
        expires_at: Utc::now().timestamp() + 3600,
    }
}

#[tokio::test]
async fn test_load_without_saved_session_returns_none() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));

    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));

    let session = session();
    store.save(&session).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("nested/cache/session.json"));

    store.save(&session()).await.unwrap();
    assert!(store.load().await.unwrap().is_some());
}

#[tokio::test]
async fn test_save_leaves_no_temporary_file() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));

    store.save(&session()).await.unwrap();

    let mut entries = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    entries.sort();
    assert_eq!(entries, vec!["session.json"]);
}

#[tokio::test]
async fn test_overwrite_replaces_previous_session() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));

    store.save(&session()).await.unwrap();

    let mut replacement = session();
    replacement.access_token = "newer".to_string();
    store.save(&replacement).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded.access_token, "newer");
}

#[tokio::test]
async fn test_clear_removes_session() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::at(dir.path().join("session.json"));

    store.save(&session()).await.unwrap();
    store.clear().await.unwrap();

    assert!(store.load().await.unwrap().is_none());

    // Clearing an already-empty store is not an error.
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_corrupt_session_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = TokenStore::at(path);
    assert!(store.load().await.is_err());
}
