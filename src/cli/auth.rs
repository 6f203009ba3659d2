use crate::{error, service::Service, success};

pub async fn auth() {
    let mut service = Service::select(false);
    match service.authenticate().await {
        Ok(()) => success!("Authenticated with {}.", service.name()),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}
