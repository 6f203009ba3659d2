//! Spotify Playlist Exporter Library
//!
//! This library retrieves a user's complete playlist library from the Spotify
//! Web API and converts it into a stable, service-independent in-memory model
//! suitable for backup or cross-service migration.
//!
//! # Modules
//!
//! - `api` - HTTP API endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy for authentication, fetching and mapping
//! - `management` - Persisted session storage
//! - `mapper` - Conversion from raw API records into the normalized model
//! - `model` - Normalized playlist/track/artist/album graph
//! - `server` - Transient local HTTP server for OAuth callbacks
//! - `service` - Music service capability interface and implementations
//! - `spotify` - Spotify Web API client, auth flow and pagination
//! - `types` - Session and raw wire type definitions
//! - `utils` - State-token generation and backoff helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod mapper;
pub mod model;
pub mod server;
pub mod service;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// All fallible operations in this crate surface a [`error::ServiceError`],
/// which callers can inspect to decide whether to re-authenticate, retry
/// later, or skip a record.
pub type Res<T> = std::result::Result<T, crate::error::ServiceError>;

/// Prints an informational message with a blue bullet point.
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Fetching playlist library...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Used to provide positive feedback when operations complete successfully.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Exported {} playlists", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates with exit code 1 immediately after printing. Only for fatal
/// errors where recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues or important information that users should
/// notice, such as partially exported playlists or skipped records.
///
/// # Example
///
/// ```
/// warning!("Playlist {} exported partially", name);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
