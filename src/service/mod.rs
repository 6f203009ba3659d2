//! Music service capability interface.
//!
//! A service exposes three capabilities: authenticate, read the user's
//! profile, and fetch the playlist library as the normalized graph.
//! Implementations are selected through the tagged [`Service`] enum rather
//! than trait objects, keeping dispatch static while the CLI stays
//! implementation-agnostic.

mod mock;
mod spotify;

pub use mock::MockService;
pub use spotify::SpotifyService;

use crate::{
    Res,
    model::{Playlist, UserProfile},
};

/// Capabilities a music streaming service offers to the exporter.
///
/// Consumers receive the normalized playlist graph read-only; shared
/// entity instances must not be mutated.
pub trait MusicService {
    /// Human-readable service name.
    fn name(&self) -> &'static str;

    /// Establishes an authenticated session, interactively if necessary.
    async fn authenticate(&mut self) -> Res<()>;

    /// The authenticated user's profile.
    async fn profile(&mut self) -> Res<UserProfile>;

    /// Fetches the user's complete playlist library (optionally capped at
    /// `limit` playlists) as the normalized graph. Playlists whose track
    /// listings could not be fully retrieved are labeled
    /// `complete = false`, never presented as complete.
    async fn fetch_library(&mut self, limit: Option<usize>) -> Res<Vec<Playlist>>;
}

/// Tagged selection of the available service implementations.
pub enum Service {
    Spotify(SpotifyService),
    Mock(MockService),
}

impl Service {
    /// Picks the implementation for the CLI's `--mock` switch.
    pub fn select(mock: bool) -> Service {
        if mock {
            Service::Mock(MockService::new())
        } else {
            Service::Spotify(SpotifyService::new())
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Service::Spotify(s) => s.name(),
            Service::Mock(s) => s.name(),
        }
    }

    pub async fn authenticate(&mut self) -> Res<()> {
        match self {
            Service::Spotify(s) => s.authenticate().await,
            Service::Mock(s) => s.authenticate().await,
        }
    }

    pub async fn profile(&mut self) -> Res<UserProfile> {
        match self {
            Service::Spotify(s) => s.profile().await,
            Service::Mock(s) => s.profile().await,
        }
    }

    pub async fn fetch_library(&mut self, limit: Option<usize>) -> Res<Vec<Playlist>> {
        match self {
            Service::Spotify(s) => s.fetch_library(limit).await,
            Service::Mock(s) => s.fetch_library(limit).await,
        }
    }
}
