//! Normalized, service-independent playlist graph.
//!
//! Tracks, artists and albums are shared by reference: the same source id
//! always resolves to the same `Arc` within one mapped batch, so an artist
//! appearing on many tracks exists exactly once. Playlists own an ordered
//! sequence of entries in source playlist order.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub release_date: String,
    pub album_type: String,
    pub artists: Vec<Arc<Artist>>,
}

/// A single recording, shared across all playlists that contain it.
///
/// `isrc` is the cross-service matching key; `None` means the source did
/// not report one, which is valid and must not block export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    pub explicit: bool,
    pub popularity: u32,
    pub preview_url: Option<String>,
    pub track_number: u32,
    pub disc_number: u32,
    pub artists: Vec<Arc<Artist>>,
    pub album: Option<Arc<Album>>,
    pub isrc: Option<String>,
}

/// One occurrence of a track inside a playlist.
///
/// `added_at`/`added_by` belong to the occurrence, not to the shared track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub track: Arc<Track>,
    pub added_at: Option<DateTime<Utc>>,
    pub added_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub display_name: String,
    pub uri: String,
}

/// Relationship between the authenticated user and a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    Owned,
    Followed,
    Collaborative,
}

impl PlaylistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistKind::Owned => "owned",
            PlaylistKind::Followed => "followed",
            PlaylistKind::Collaborative => "collaborative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub uri: String,
    pub kind: PlaylistKind,
    pub public: bool,
    pub collaborative: bool,
    pub owner: Owner,
    pub follower_count: u64,
    /// Track count as reported by the source API.
    pub track_count: u64,
    pub snapshot_id: String,
    /// Entries in source playlist order.
    pub entries: Vec<PlaylistEntry>,
    /// False when some track pages could not be retrieved; such playlists
    /// are presented as partial, never as complete.
    pub complete: bool,
}

impl Playlist {
    /// Total duration of all retrieved entries in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.track.duration_ms).sum()
    }

    /// Sorted, de-duplicated names of every artist appearing in the playlist.
    pub fn unique_artists(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .entries
            .iter()
            .flat_map(|e| e.track.artists.iter().map(|a| a.name.clone()))
            .collect();
        names.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub country: String,
    pub follower_count: u64,
    pub uri: String,
    /// Subscription level reported by the service (e.g. "free", "premium").
    pub product: String,
}
