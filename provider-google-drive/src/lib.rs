//! # Google Drive Provider
//!
//! Implements `RemoteDrive` for the Google Drive API v2.
//!
//! ## Overview
//!
//! This module provides:
//! - File metadata lookups (`files.get`), including the `root` alias
//! - Paginated change-feed listing (`changes.list`) by page token or start change ID
//! - Exponential backoff for rate limiting and server errors
//!
//! Authentication is out of scope: the connector is handed a valid OAuth 2.0
//! access token and sends it as a bearer token.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
