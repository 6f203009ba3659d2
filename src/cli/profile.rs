use tabled::Table;

use crate::{error, service::Service, types::ProfileTableRow};

pub async fn profile(mock: bool) {
    let mut service = Service::select(mock);
    if let Err(e) = service.authenticate().await {
        if e.needs_reauth() {
            error!("No usable session. Please run spexport auth\n Error: {}", e);
        }
        error!("Authentication failed. Err: {}", e);
    }

    let profile = match service.profile().await {
        Ok(profile) => profile,
        Err(e) => error!("Failed to load profile. Err: {}", e),
    };

    let rows = vec![
        ProfileTableRow {
            field: "Display name".to_string(),
            value: profile.display_name,
        },
        ProfileTableRow {
            field: "User id".to_string(),
            value: profile.id,
        },
        ProfileTableRow {
            field: "Email".to_string(),
            value: profile.email,
        },
        ProfileTableRow {
            field: "Country".to_string(),
            value: profile.country,
        },
        ProfileTableRow {
            field: "Followers".to_string(),
            value: profile.follower_count.to_string(),
        },
        ProfileTableRow {
            field: "Product".to_string(),
            value: profile.product,
        },
    ];

    let table = Table::new(rows);
    println!("{}", table);
}
