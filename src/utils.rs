use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;

/// Base delay for exponential backoff between retries.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Maximum random jitter added to each backoff delay.
const RETRY_JITTER_MS: u64 = 250;

/// Generates the single-use state token for one authorization attempt.
///
/// 32 bytes of cryptographic randomness, URL-safe base64 without padding.
/// The token travels through the redirect and is checked for exact match
/// on the callback.
pub fn generate_state_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Exponential backoff delay with jitter for retry attempt `attempt`
/// (1-based).
///
/// Doubles the base delay per attempt and adds up to [`RETRY_JITTER_MS`]
/// of random jitter so concurrent clients do not retry in lockstep.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = RETRY_BASE_DELAY_MS * 2u64.pow(attempt.saturating_sub(1));
    let jitter = rand::rng().random_range(0..RETRY_JITTER_MS);
    Duration::from_millis(base + jitter)
}

/// Formats a millisecond duration as `h:mm` or `m:ss` for table output.
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
