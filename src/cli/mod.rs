//! # CLI Module
//!
//! User-facing commands for the playlist exporter. Each command selects a
//! service implementation, drives it and renders the result, keeping
//! progress feedback and error presentation out of the service layer.
//!
//! - [`auth`] - runs the interactive authorization flow and persists the
//!   resulting session
//! - [`playlists`] - fetches the playlist library and renders it as a table
//! - [`profile`] - shows the authenticated user's profile
//!
//! Errors that mean the stored session is unusable direct the user to
//! `spexport auth` instead of dumping the raw failure.

mod auth;
mod playlists;
mod profile;

pub use auth::auth;
pub use playlists::playlists;
pub use profile::profile;
