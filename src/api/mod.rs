//! # API Module
//!
//! HTTP endpoints served by the transient local callback server during an
//! authorization flow.
//!
//! - [`callback`] - receives the OAuth redirect, validates the CSRF state
//!   parameter and completes the code-for-token exchange
//! - [`health`] - health check returning status and version

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
