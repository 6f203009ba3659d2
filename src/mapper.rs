//! Conversion of raw API records into the normalized model.
//!
//! The mapper is pure: no I/O, no retries, no suspension points. It keeps
//! per-batch interning maps so every artist, album and track id resolves to
//! one shared instance across the whole batch. Malformed records yield a
//! [`ServiceError::MappingError`] naming the offending record id; the caller
//! may skip-and-log them, but they are never silently swallowed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    Res,
    error::ServiceError,
    model::{Album, Artist, Owner, Playlist, PlaylistEntry, PlaylistKind, Track, UserProfile},
};

/// Maps raw playlist and track records into the normalized graph,
/// de-duplicating entities by source id for the lifetime of the mapper.
///
/// Use one mapper per fetched batch so de-duplication is applied
/// consistently across all playlists of the batch.
#[derive(Debug, Default)]
pub struct Mapper {
    current_user_id: Option<String>,
    artists: HashMap<String, Arc<Artist>>,
    albums: HashMap<String, Arc<Album>>,
    tracks: HashMap<String, Arc<Track>>,
}

impl Mapper {
    pub fn new(current_user_id: Option<String>) -> Self {
        Mapper {
            current_user_id,
            ..Default::default()
        }
    }

    /// Maps a raw playlist record (without its track entries).
    ///
    /// The playlist kind is derived from the owner: playlists owned by the
    /// current user are `Owned` (or `Collaborative`), all others `Followed`.
    pub fn map_playlist(&mut self, raw: &Value) -> Res<Playlist> {
        let id = require_str(raw, "id", "<unknown>")?;
        let name = require_str(raw, "name", &id)?;

        let owner_raw = raw
            .get("owner")
            .ok_or_else(|| mapping_error(&id, "missing owner"))?;
        let owner = Owner {
            id: require_str(owner_raw, "id", &id)?,
            display_name: str_or_default(owner_raw, "display_name"),
            uri: str_or_default(owner_raw, "uri"),
        };

        let collaborative = raw
            .get("collaborative")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let kind = match &self.current_user_id {
            Some(user) if *user == owner.id => {
                if collaborative {
                    PlaylistKind::Collaborative
                } else {
                    PlaylistKind::Owned
                }
            }
            _ => PlaylistKind::Followed,
        };

        Ok(Playlist {
            name,
            description: opt_str(raw, "description"),
            uri: str_or_default(raw, "uri"),
            kind,
            public: raw.get("public").and_then(Value::as_bool).unwrap_or(false),
            collaborative,
            owner,
            follower_count: raw
                .pointer("/followers/total")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            track_count: raw
                .pointer("/tracks/total")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            snapshot_id: str_or_default(raw, "snapshot_id"),
            entries: Vec::new(),
            complete: true,
            id,
        })
    }

    /// Maps one entry of a playlist's track listing.
    ///
    /// Returns `Ok(None)` for null or local-file entries, which carry no
    /// stable source id and cannot enter the normalized graph.
    pub fn map_track_item(&mut self, raw: &Value) -> Res<Option<PlaylistEntry>> {
        let track_raw = match raw.get("track") {
            Some(t) if !t.is_null() => t,
            _ => return Ok(None),
        };
        if track_raw.get("id").map(Value::is_null).unwrap_or(true) {
            // Local files have a null id; nothing stable to key on.
            return Ok(None);
        }

        let track = self.intern_track(track_raw)?;
        let added_at = raw
            .get("added_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let added_by = raw.pointer("/added_by/id").and_then(Value::as_str);

        Ok(Some(PlaylistEntry {
            track,
            added_at,
            added_by: added_by.map(str::to_string),
        }))
    }

    /// Maps the authenticated user's profile record.
    pub fn map_profile(raw: &Value) -> Res<UserProfile> {
        let id = require_str(raw, "id", "<unknown>")?;
        Ok(UserProfile {
            display_name: raw
                .get("display_name")
                .and_then(Value::as_str)
                .unwrap_or(&id)
                .to_string(),
            email: str_or_default(raw, "email"),
            country: str_or_default(raw, "country"),
            follower_count: raw
                .pointer("/followers/total")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            uri: str_or_default(raw, "uri"),
            product: raw
                .get("product")
                .and_then(Value::as_str)
                .unwrap_or("free")
                .to_string(),
            id,
        })
    }

    fn intern_track(&mut self, raw: &Value) -> Res<Arc<Track>> {
        let id = require_str(raw, "id", "<unknown>")?;
        if let Some(track) = self.tracks.get(&id) {
            return Ok(Arc::clone(track));
        }

        let name = require_str(raw, "name", &id)?;
        let artists = self.intern_artists(raw.get("artists"), &id)?;
        let album = match raw.get("album") {
            Some(album_raw) if !album_raw.is_null() => Some(self.intern_album(album_raw, &id)?),
            _ => None,
        };

        // Absent ISRC is represented as None, never as an empty string.
        let isrc = raw
            .pointer("/external_ids/isrc")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let track = Arc::new(Track {
            name,
            uri: str_or_default(raw, "uri"),
            duration_ms: raw
                .get("duration_ms")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            explicit: raw
                .get("explicit")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            popularity: raw.get("popularity").and_then(Value::as_u64).unwrap_or(0) as u32,
            preview_url: opt_str(raw, "preview_url"),
            track_number: raw.get("track_number").and_then(Value::as_u64).unwrap_or(1) as u32,
            disc_number: raw.get("disc_number").and_then(Value::as_u64).unwrap_or(1) as u32,
            artists,
            album,
            isrc,
            id: id.clone(),
        });
        self.tracks.insert(id, Arc::clone(&track));
        Ok(track)
    }

    fn intern_album(&mut self, raw: &Value, record: &str) -> Res<Arc<Album>> {
        let id = require_str(raw, "id", record)?;
        if let Some(album) = self.albums.get(&id) {
            return Ok(Arc::clone(album));
        }

        let album = Arc::new(Album {
            name: require_str(raw, "name", &id)?,
            uri: str_or_default(raw, "uri"),
            release_date: str_or_default(raw, "release_date"),
            album_type: raw
                .get("album_type")
                .and_then(Value::as_str)
                .unwrap_or("album")
                .to_string(),
            artists: self.intern_artists(raw.get("artists"), &id)?,
            id: id.clone(),
        });
        self.albums.insert(id, Arc::clone(&album));
        Ok(album)
    }

    fn intern_artists(&mut self, raw: Option<&Value>, record: &str) -> Res<Vec<Arc<Artist>>> {
        let Some(list) = raw.and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut artists = Vec::with_capacity(list.len());
        for artist_raw in list {
            let id = require_str(artist_raw, "id", record)?;
            let artist = match self.artists.get(&id) {
                Some(existing) => Arc::clone(existing),
                None => {
                    let artist = Arc::new(Artist {
                        name: require_str(artist_raw, "name", &id)?,
                        uri: str_or_default(artist_raw, "uri"),
                        id: id.clone(),
                    });
                    self.artists.insert(id, Arc::clone(&artist));
                    artist
                }
            };
            artists.push(artist);
        }
        Ok(artists)
    }
}

fn mapping_error(record: &str, detail: impl Into<String>) -> ServiceError {
    ServiceError::MappingError {
        record: record.to_string(),
        detail: detail.into(),
    }
}

fn require_str(raw: &Value, field: &str, record: &str) -> Res<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| mapping_error(record, format!("missing required field '{field}'")))
}

fn str_or_default(raw: &Value, field: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str(raw: &Value, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
