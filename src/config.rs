//! Configuration management for the Spotify playlist exporter.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and `.env` files. Credentials come from the user's
//! local data directory so they never need to be hardcoded or committed.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use dotenv;
use std::{env, path::PathBuf};

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// variables from `spexport/.env` in the platform-specific local data
/// directory:
/// - Linux: `~/.local/share/spexport/.env`
/// - macOS: `~/Library/Application Support/spexport/.env`
/// - Windows: `%LOCALAPPDATA%/spexport/.env`
///
/// A missing `.env` file is not an error; variables may also come from the
/// process environment.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spexport/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns the bind address for the local OAuth callback server.
///
/// Defaults to `127.0.0.1:8000`, matching the default redirect URI.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8000".to_string())
}

/// Returns the Spotify API client ID for authentication.
///
/// # Panics
///
/// Panics if the `SPOTIFY_CLIENT_ID` environment variable is not set.
pub fn client_id() -> String {
    env::var("SPOTIFY_CLIENT_ID").expect("SPOTIFY_CLIENT_ID must be set")
}

/// Returns the Spotify API client secret for authentication.
///
/// The client secret is a credential and must never appear in logs or
/// version control.
///
/// # Panics
///
/// Panics if the `SPOTIFY_CLIENT_SECRET` environment variable is not set.
pub fn client_secret() -> String {
    env::var("SPOTIFY_CLIENT_SECRET").expect("SPOTIFY_CLIENT_SECRET must be set")
}

/// Returns the OAuth redirect URI.
///
/// Must match the redirect URI registered in the Spotify application
/// settings. Defaults to `http://127.0.0.1:8000/callback`.
pub fn redirect_uri() -> String {
    env::var("SPOTIFY_REDIRECT_URI")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/callback".to_string())
}

/// Returns the OAuth scope string requested during authorization.
///
/// The default covers private and collaborative playlist reads plus the
/// profile fields used by the exporter.
pub fn scope() -> String {
    env::var("SPOTIFY_SCOPE").unwrap_or_else(|_| {
        "playlist-read-private playlist-read-collaborative user-read-private user-read-email"
            .to_string()
    })
}

/// Returns the Spotify OAuth authorization URL.
pub fn auth_url() -> String {
    env::var("SPOTIFY_AUTH_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/authorize".to_string())
}

/// Returns the Spotify OAuth token exchange URL.
pub fn token_url() -> String {
    env::var("SPOTIFY_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string())
}

/// Returns the Spotify Web API base URL.
pub fn api_url() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| "https://api.spotify.com/v1".to_string())
}
