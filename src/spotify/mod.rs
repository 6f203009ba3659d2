//! # Spotify Integration Module
//!
//! Integration layer between the exporter and the Spotify Web API. It
//! covers the three concerns the rest of the application builds on:
//!
//! - [`auth`] - OAuth 2.0 authorization-code flow with CSRF state
//!   validation, session refresh and persistence
//! - [`client`] - authenticated HTTP client with transparent token refresh
//!   and bounded retry/backoff for rate limits and transient failures
//! - [`pager`] - lazy, forward-only pagination over arbitrarily large
//!   collections with partial-result recovery
//!
//! ## Covered endpoints
//!
//! - `POST /api/token` - code exchange and refresh (accounts host)
//! - `GET /me` - authenticated user's profile
//! - `GET /me/playlists` - playlist library index, offset-paginated
//! - `GET /playlists/{id}/tracks` - playlist track listings with a field
//!   projection, offset-paginated
//!
//! ## Error handling
//!
//! All functions return [`crate::Res`] with a typed
//! [`crate::error::ServiceError`]: rate-limit exhaustion, transient network
//! failure, permanent request errors and authentication-required conditions
//! are distinguished so callers can re-authenticate, retry later, or give
//! up per record.

pub mod auth;
pub mod client;
pub mod pager;
