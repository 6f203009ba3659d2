use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::{
    spotify,
    types::{AuthFailure, SharedAuthState},
    warning,
};

/// Handles the OAuth redirect from the authorization server.
///
/// The `state` query parameter must exactly equal the single-use token
/// generated for the pending attempt; a mismatch or missing value is
/// recorded as a CSRF failure and the token exchange is never attempted.
/// On a valid callback the authorization code is exchanged for a session
/// and the outcome stored for the waiting flow.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedAuthState>,
) -> Html<&'static str> {
    let mut lock = shared_state.lock().await;
    let Some(attempt) = lock.as_mut() else {
        return Html("<h4>No authorization attempt in progress.</h4>");
    };
    if !attempt.is_pending() {
        return Html("<h4>This authorization attempt has already completed.</h4>");
    }

    if let Some(error) = params.get("error") {
        attempt.outcome = Some(Err(AuthFailure::Provider(error.clone())));
        return Html("<h4>Authorization was denied.</h4>");
    }

    // CSRF protection: exact match against the stored state token, checked
    // before anything else is looked at.
    match params.get("state") {
        Some(state) if *state == attempt.state => {}
        _ => {
            attempt.outcome = Some(Err(AuthFailure::StateMismatch));
            return Html("<h4>State validation failed.</h4>");
        }
    }

    let Some(code) = params.get("code") else {
        attempt.outcome = Some(Err(AuthFailure::Provider(
            "missing authorization code".to_string(),
        )));
        return Html("<h4>Missing authorization code.</h4>");
    };

    match spotify::auth::exchange_code(code).await {
        Ok(session) => {
            attempt.outcome = Some(Ok(session));
            Html("<h2>Authentication successful.</h2><p>You can close this window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            attempt.outcome = Some(Err(AuthFailure::Exchange(e.to_string())));
            Html("<h4>Login failed.</h4>")
        }
    }
}
