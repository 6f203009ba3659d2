use std::collections::HashMap;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::{
    Res,
    error::ServiceError,
    management::TokenStore,
    mapper::Mapper,
    model::{Playlist, UserProfile},
    service::MusicService,
    spotify::{self, client::SpotifyClient, pager::Paginator},
    warning,
};

/// Spotify's maximum page size for playlist collections.
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Page size for playlist track listings.
const TRACK_PAGE_SIZE: u32 = 50;

/// How many playlists have their track listings fetched in parallel.
/// Deliberately small to stay inside the API's rate limits.
const TRACK_FETCH_CONCURRENCY: usize = 3;

/// Field projection for track listing requests; keeps response payloads to
/// the fields the mapper consumes.
const TRACK_FIELDS: &str = "items(track(id,name,uri,duration_ms,explicit,popularity,track_number,disc_number,artists(id,name,uri),album(id,name,uri,release_date,album_type,artists(id,name,uri)),external_ids),added_at,added_by(id)),next,total";

/// The real Spotify Web API service.
///
/// Wires the authenticated client, the paginated fetcher and the domain
/// mapper into the [`MusicService`] capabilities.
pub struct SpotifyService {
    store: TokenStore,
    client: Option<SpotifyClient>,
    profile: Option<UserProfile>,
}

impl SpotifyService {
    pub fn new() -> Self {
        SpotifyService::with_store(TokenStore::new())
    }

    pub fn with_store(store: TokenStore) -> Self {
        SpotifyService {
            store,
            client: None,
            profile: None,
        }
    }

    fn client(&self) -> Res<&SpotifyClient> {
        self.client
            .as_ref()
            .ok_or(ServiceError::AuthenticationRequired)
    }
}

impl Default for SpotifyService {
    fn default() -> Self {
        SpotifyService::new()
    }
}

impl MusicService for SpotifyService {
    fn name(&self) -> &'static str {
        "Spotify"
    }

    async fn authenticate(&mut self) -> Res<()> {
        let session =
            spotify::auth::authenticate(&self.store, spotify::auth::shared_state()).await?;
        self.client = Some(SpotifyClient::from_config(session, self.store.clone())?);
        Ok(())
    }

    async fn profile(&mut self) -> Res<UserProfile> {
        if let Some(profile) = &self.profile {
            return Ok(profile.clone());
        }

        let raw = self.client()?.get("/me", &[]).await?;
        let profile = Mapper::map_profile(&raw)?;
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    async fn fetch_library(&mut self, limit: Option<usize>) -> Res<Vec<Playlist>> {
        // The playlist kind derivation needs the user's id; a profile
        // failure degrades every playlist to "followed" instead of
        // aborting the export.
        let current_user = match self.profile().await {
            Ok(profile) => Some(profile.id),
            Err(e) => {
                warning!("Could not load user profile: {}", e);
                None
            }
        };
        let client = self.client()?.clone();
        let mut mapper = Mapper::new(current_user);

        // Page through the playlist index. A page failure here aborts the
        // whole fetch, but the records gathered so far travel in the error.
        let page_size = limit
            .map(|l| (l as u32).min(PLAYLIST_PAGE_SIZE))
            .unwrap_or(PLAYLIST_PAGE_SIZE)
            .max(1);
        let mut pager = Paginator::new(&client, "/me/playlists", page_size);
        let mut raw_playlists: Vec<Value> = Vec::new();
        loop {
            let offset = pager.offset();
            match pager.next_page().await {
                Ok(Some(items)) => raw_playlists.extend(items),
                Ok(None) => break,
                Err(e) => {
                    return Err(ServiceError::PageFetchFailed {
                        offset,
                        partial: raw_playlists,
                        source: Box::new(e),
                    });
                }
            }
            if let Some(limit) = limit {
                if raw_playlists.len() >= limit {
                    raw_playlists.truncate(limit);
                    break;
                }
            }
        }

        let mut playlists: Vec<Playlist> = Vec::new();
        for raw in &raw_playlists {
            match mapper.map_playlist(raw) {
                Ok(playlist) => playlists.push(playlist),
                Err(e) => warning!("Skipping malformed playlist record: {}", e),
            }
        }

        // Track listings with bounded fan-out; completion order inside a
        // chunk is free, but entries stay in source order per playlist and
        // the result is complete before we return.
        let pb = ProgressBar::new(playlists.len() as u64);
        pb.set_message("Fetching playlist tracks...");
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} {pos}/{len}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        let ids: Vec<String> = playlists.iter().map(|p| p.id.clone()).collect();
        let mut fetched: HashMap<String, (Vec<Value>, bool)> = HashMap::new();
        for chunk in ids.chunks(TRACK_FETCH_CONCURRENCY) {
            let mut handles = Vec::new();
            for id in chunk {
                let client = client.clone();
                let id = id.clone();
                handles.push(tokio::spawn(async move {
                    let outcome = fetch_track_items(&client, &id).await;
                    (id, outcome)
                }));
            }
            for handle in handles {
                match handle.await {
                    Ok((id, outcome)) => {
                        pb.inc(1);
                        fetched.insert(id, outcome);
                    }
                    Err(e) => warning!("Task join error: {}", e),
                }
            }
        }
        pb.finish_and_clear();

        for playlist in &mut playlists {
            let Some((items, complete)) = fetched.remove(&playlist.id) else {
                playlist.complete = false;
                continue;
            };
            playlist.complete = complete;
            for item in &items {
                match mapper.map_track_item(item) {
                    Ok(Some(entry)) => playlist.entries.push(entry),
                    Ok(None) => {} // null or local-file entry
                    Err(e) => {
                        warning!("Playlist '{}': skipping record: {}", playlist.name, e)
                    }
                }
            }
        }

        Ok(playlists)
    }
}

/// Fetches all track-listing records of one playlist.
///
/// A page failure after the client's retries keeps the records gathered so
/// far and reports the listing as incomplete rather than dropping it.
async fn fetch_track_items(client: &SpotifyClient, playlist_id: &str) -> (Vec<Value>, bool) {
    let path = format!("/playlists/{playlist_id}/tracks");
    let mut pager =
        Paginator::new(client, path, TRACK_PAGE_SIZE).with_query("fields", TRACK_FIELDS);

    match pager.fetch_all().await {
        Ok(items) => (items, true),
        Err(ServiceError::PageFetchFailed {
            offset,
            partial,
            source,
        }) => {
            warning!(
                "Playlist {}: page at offset {} failed after retries ({}); keeping {} records already fetched",
                playlist_id,
                offset,
                source,
                partial.len()
            );
            (partial, false)
        }
        Err(e) => {
            warning!("Playlist {}: track fetch failed: {}", playlist_id, e);
            (Vec::new(), false)
        }
    }
}
