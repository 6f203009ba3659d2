use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Res,
    error::ServiceError,
    model::{
        Album, Artist, Owner, Playlist, PlaylistEntry, PlaylistKind, Track, UserProfile,
    },
    service::MusicService,
};

/// In-memory service with a small fixed library.
///
/// Serves development and demos without credentials or network access. The
/// fixture deliberately shares one track between two playlists so consumers
/// see the same entity-sharing the real service produces.
pub struct MockService {
    authenticated: bool,
    playlists: Vec<Playlist>,
}

impl MockService {
    pub fn new() -> Self {
        MockService {
            authenticated: false,
            playlists: build_library(),
        }
    }

    fn ensure_authenticated(&self) -> Res<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(ServiceError::AuthenticationRequired)
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        MockService::new()
    }
}

impl MusicService for MockService {
    fn name(&self) -> &'static str {
        "Spotify (mock)"
    }

    async fn authenticate(&mut self) -> Res<()> {
        self.authenticated = true;
        Ok(())
    }

    async fn profile(&mut self) -> Res<UserProfile> {
        self.ensure_authenticated()?;
        Ok(UserProfile {
            id: "mock_user_123".to_string(),
            display_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            country: "US".to_string(),
            follower_count: 42,
            uri: "spotify:user:mock_user_123".to_string(),
            product: "premium".to_string(),
        })
    }

    async fn fetch_library(&mut self, limit: Option<usize>) -> Res<Vec<Playlist>> {
        self.ensure_authenticated()?;
        let mut playlists = self.playlists.clone();
        if let Some(limit) = limit {
            playlists.truncate(limit);
        }
        Ok(playlists)
    }
}

fn artist(id: &str, name: &str) -> Arc<Artist> {
    Arc::new(Artist {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:artist:{id}"),
    })
}

fn owner(id: &str, display_name: &str) -> Owner {
    Owner {
        id: id.to_string(),
        display_name: display_name.to_string(),
        uri: format!("spotify:user:{id}"),
    }
}

fn build_library() -> Vec<Playlist> {
    let taylor_swift = artist("06HL4z0CvFAxyc27GXpf02", "Taylor Swift");
    let the_beatles = artist("3WrFJ7ztbogyGnTHbHJFl2", "The Beatles");
    let radiohead = artist("4Z8W4fKeB5YxbusRsdQVPb", "Radiohead");

    let folklore = Arc::new(Album {
        id: "2fenSS68JI1h4Fo296JfGr".to_string(),
        name: "folklore".to_string(),
        uri: "spotify:album:2fenSS68JI1h4Fo296JfGr".to_string(),
        release_date: "2020-07-24".to_string(),
        album_type: "album".to_string(),
        artists: vec![taylor_swift.clone()],
    });
    let abbey_road = Arc::new(Album {
        id: "0ETFjACtuP2ADo6LFhL6HN".to_string(),
        name: "Abbey Road".to_string(),
        uri: "spotify:album:0ETFjACtuP2ADo6LFhL6HN".to_string(),
        release_date: "1969-09-26".to_string(),
        album_type: "album".to_string(),
        artists: vec![the_beatles.clone()],
    });
    let ok_computer = Arc::new(Album {
        id: "6dVIqQ8qmQ5GBnJ9shOYGE".to_string(),
        name: "OK Computer".to_string(),
        uri: "spotify:album:6dVIqQ8qmQ5GBnJ9shOYGE".to_string(),
        release_date: "1997-07-01".to_string(),
        album_type: "album".to_string(),
        artists: vec![radiohead.clone()],
    });

    let cardigan = Arc::new(Track {
        id: "4R2kfaDFhslZEMSK0SuBjU".to_string(),
        name: "cardigan".to_string(),
        uri: "spotify:track:4R2kfaDFhslZEMSK0SuBjU".to_string(),
        duration_ms: 239_560,
        explicit: false,
        popularity: 85,
        preview_url: None,
        track_number: 1,
        disc_number: 1,
        artists: vec![taylor_swift.clone()],
        album: Some(folklore),
        isrc: Some("USUG22001234".to_string()),
    });
    let come_together = Arc::new(Track {
        id: "2EqlS6tkEnglzr7tkKAAYD".to_string(),
        name: "Come Together".to_string(),
        uri: "spotify:track:2EqlS6tkEnglzr7tkKAAYD".to_string(),
        duration_ms: 259_893,
        explicit: false,
        popularity: 90,
        preview_url: None,
        track_number: 1,
        disc_number: 1,
        artists: vec![the_beatles.clone()],
        album: Some(abbey_road),
        isrc: Some("GBUMB7700123".to_string()),
    });
    let paranoid_android = Arc::new(Track {
        id: "6LgJvl0Xdtc73RJ1WBKQYY".to_string(),
        name: "Paranoid Android".to_string(),
        uri: "spotify:track:6LgJvl0Xdtc73RJ1WBKQYY".to_string(),
        duration_ms: 383_066,
        explicit: false,
        popularity: 88,
        preview_url: None,
        track_number: 2,
        disc_number: 1,
        artists: vec![radiohead.clone()],
        album: Some(ok_computer),
        isrc: Some("GBAJE9700456".to_string()),
    });

    let me = owner("mock_user_123", "Test User");
    let entry = |track: &Arc<Track>, days_ago: i64| PlaylistEntry {
        track: track.clone(),
        added_at: Some(Utc::now() - Duration::days(days_ago)),
        added_by: Some("mock_user_123".to_string()),
    };

    vec![
        Playlist {
            id: "playlist_1".to_string(),
            name: "My Favorite Songs".to_string(),
            description: Some("A collection of my all-time favorite tracks".to_string()),
            uri: "spotify:playlist:playlist_1".to_string(),
            kind: PlaylistKind::Owned,
            public: true,
            collaborative: false,
            owner: me.clone(),
            follower_count: 23,
            track_count: 3,
            snapshot_id: "MTY4ODA5NDg4NSwwMDAwMDAwMDAwMDA=".to_string(),
            entries: vec![
                entry(&cardigan, 30),
                entry(&come_together, 45),
                entry(&paranoid_android, 60),
            ],
            complete: true,
        },
        Playlist {
            id: "playlist_2".to_string(),
            name: "Road Trip Vibes".to_string(),
            description: Some("Perfect songs for long drives".to_string()),
            uri: "spotify:playlist:playlist_2".to_string(),
            kind: PlaylistKind::Collaborative,
            public: false,
            collaborative: true,
            owner: me,
            follower_count: 5,
            track_count: 2,
            snapshot_id: "MTY4ODA5NDg4NSwwMDAwMDAwMDAwMDE=".to_string(),
            entries: vec![entry(&come_together, 45), entry(&paranoid_android, 60)],
            complete: true,
        },
        Playlist {
            id: "playlist_3".to_string(),
            name: "Chill Indie Folk".to_string(),
            description: Some("Relaxing indie folk for quiet moments".to_string()),
            uri: "spotify:playlist:playlist_3".to_string(),
            kind: PlaylistKind::Followed,
            public: true,
            collaborative: false,
            owner: owner("spotify", "Spotify"),
            follower_count: 1247,
            track_count: 1,
            snapshot_id: "MTY4ODA5NDg4NSwwMDAwMDAwMDAwMDI=".to_string(),
            entries: vec![entry(&cardigan, 120)],
            complete: true,
        },
    ]
}
