use std::sync::{Arc, LazyLock};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    Res, config,
    error::ServiceError,
    info,
    management::TokenStore,
    server::start_callback_server,
    spotify::client::http_client,
    types::{AuthAttempt, AuthFailure, Session, SharedAuthState, TokenResponse},
    utils, warning,
};

/// Maximum time to wait for the OAuth callback.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between polls of the shared attempt state.
const CALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(1);

static AUTH_STATE: LazyLock<SharedAuthState> = LazyLock::new(|| Arc::new(Mutex::new(None)));

/// The process-wide attempt slot. Every interactive flow goes through this
/// one slot, so at most one flow can await a callback per process no matter
/// how many service instances exist.
pub fn shared_state() -> SharedAuthState {
    SharedAuthState::clone(&AUTH_STATE)
}

/// Produces a valid session, interactively only when necessary.
///
/// 1. A persisted, unexpired session is used as-is.
/// 2. An expired but renewable session is refreshed at the token endpoint.
/// 3. Otherwise the full authorization-code flow runs in the browser.
///
/// Whatever path succeeds, the resulting session is persisted before it is
/// returned.
pub async fn authenticate(store: &TokenStore, shared_state: SharedAuthState) -> Res<Session> {
    if let Some(session) = store.load().await? {
        if !session.is_expired() {
            return Ok(session);
        }
        if session.is_renewable() {
            info!("Access token expired, refreshing...");
            match refresh_session(&session, store).await {
                Ok(refreshed) => return Ok(refreshed),
                Err(e) => {
                    warning!("Token refresh failed ({}), starting a new authorization flow", e);
                }
            }
        }
    }

    let session = run_flow(shared_state).await?;
    store.save(&session).await?;
    Ok(session)
}

/// Runs the interactive OAuth2 authorization-code flow.
///
/// The flow is a strict state machine. IDLE: a fresh single-use state token
/// is generated and stored as the pending attempt. AWAITING_CALLBACK: a
/// transient local listener is started and the authorization URL opened in
/// the browser. The callback handler validates the returned state parameter
/// (EXCHANGING) and records the exchange outcome. COMPLETE/FAILED: the
/// listener is torn down on every exit path and the outcome is surfaced.
///
/// Starting a flow while another is still awaiting its callback is a
/// precondition violation and fails with
/// [`ServiceError::FlowAlreadyPending`].
pub async fn run_flow(shared_state: SharedAuthState) -> Res<Session> {
    let state_token = utils::generate_state_token();

    {
        let mut lock = shared_state.lock().await;
        if lock.as_ref().map(AuthAttempt::is_pending).unwrap_or(false) {
            return Err(ServiceError::FlowAlreadyPending);
        }
        *lock = Some(AuthAttempt::new(state_token.clone()));
    }

    // Transient listener for the redirect; torn down on every exit path.
    let server_state = SharedAuthState::clone(&shared_state);
    let server = tokio::spawn(async move {
        start_callback_server(server_state).await;
    });

    let auth_url = format!(
        "{auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&scope={scope}&state={state}&show_dialog=true",
        auth_url = &config::auth_url(),
        client_id = &config::client_id(),
        redirect_uri = &config::redirect_uri(),
        scope = &config::scope(),
        state = state_token,
    );

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = wait_for_outcome(&shared_state).await;
    server.abort();

    // The attempt is finished either way; allow a future flow to start.
    {
        let mut lock = shared_state.lock().await;
        *lock = None;
    }

    match outcome {
        Some(Ok(session)) => Ok(session),
        Some(Err(AuthFailure::StateMismatch)) => Err(ServiceError::CsrfValidationFailed),
        Some(Err(AuthFailure::Provider(e))) => Err(ServiceError::TokenExchange(e)),
        Some(Err(AuthFailure::Exchange(e))) => Err(ServiceError::TokenExchange(e)),
        None => Err(ServiceError::CallbackTimeout),
    }
}

/// Polls the shared attempt until the callback records an outcome or the
/// wait window elapses.
async fn wait_for_outcome(
    shared_state: &SharedAuthState,
) -> Option<Result<Session, AuthFailure>> {
    use std::time::Instant;

    let start = Instant::now();
    while start.elapsed() < CALLBACK_TIMEOUT {
        let lock: MutexGuard<'_, Option<AuthAttempt>> = shared_state.lock().await;
        if let Some(attempt) = lock.as_ref() {
            if let Some(outcome) = &attempt.outcome {
                return Some(outcome.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(CALLBACK_POLL_INTERVAL).await;
    }

    None
}

/// Exchanges an authorization code for a session at the token endpoint.
///
/// Any non-2xx response fails with [`ServiceError::TokenExchange`] carrying
/// the raw error payload for diagnostics.
pub async fn exchange_code(code: &str) -> Res<Session> {
    let client = http_client()?;
    let response = client
        .post(&config::token_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config::redirect_uri()),
            ("client_id", &config::client_id()),
            ("client_secret", &config::client_secret()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::TokenExchange(body));
    }

    let token: TokenResponse = serde_json::from_value(response.json().await?)?;
    Ok(Session::from_token_response(token, None))
}

/// Renews an expired session with its refresh token and persists the
/// replacement. An `invalid_grant` rejection clears the store; the session
/// is no longer renewable and re-authorization is required.
async fn refresh_session(session: &Session, store: &TokenStore) -> Res<Session> {
    let refresh_token = session
        .refresh_token
        .clone()
        .ok_or(ServiceError::AuthenticationRequired)?;

    let client = http_client()?;
    let response = client
        .post(&config::token_url())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", &config::client_id()),
            ("client_secret", &config::client_secret()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        if body.contains("invalid_grant") {
            store.clear().await?;
        }
        return Err(ServiceError::AuthenticationRequired);
    }

    let token: TokenResponse = serde_json::from_value(response.json().await?)?;
    let refreshed = Session::from_token_response(token, Some(refresh_token));
    store.save(&refreshed).await?;
    Ok(refreshed)
}
