use tabled::Table;

use crate::{
    error,
    model::Playlist,
    service::Service,
    success,
    types::PlaylistTableRow,
    utils, warning,
};

pub async fn playlists(limit: Option<usize>, mock: bool) {
    let mut service = Service::select(mock);
    if let Err(e) = service.authenticate().await {
        if e.needs_reauth() {
            error!("No usable session. Please run spexport auth\n Error: {}", e);
        }
        error!("Authentication failed. Err: {}", e);
    }

    let playlists = match service.fetch_library(limit).await {
        Ok(playlists) => playlists,
        Err(e) => {
            if e.needs_reauth() {
                error!("Session expired. Please run spexport auth\n Error: {}", e);
            }
            error!("Failed to fetch playlists. Err: {}", e);
        }
    };

    let partial = playlists.iter().filter(|p| !p.complete).count();
    if partial > 0 {
        warning!(
            "{} playlist(s) could not be fully retrieved and are shown as partial.",
            partial
        );
    }

    let table_rows: Vec<PlaylistTableRow> = playlists.iter().map(table_row).collect();
    let table = Table::new(table_rows);
    println!("{}", table);

    success!(
        "Fetched {} playlists from {}.",
        playlists.len(),
        service.name()
    );
}

fn table_row(playlist: &Playlist) -> PlaylistTableRow {
    let tracks = if playlist.complete {
        format!("{}", playlist.entries.len())
    } else {
        format!("{} of {} (partial)", playlist.entries.len(), playlist.track_count)
    };

    PlaylistTableRow {
        name: playlist.name.clone(),
        owner: playlist.owner.display_name.clone(),
        kind: playlist.kind.as_str().to_string(),
        tracks,
        duration: utils::format_duration_ms(playlist.total_duration_ms()),
        visibility: if playlist.public { "public" } else { "private" }.to_string(),
    }
}
