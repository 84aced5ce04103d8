//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest` with connection pooling and timeouts
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use provider_google_drive::GoogleDriveConnector;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let remote = GoogleDriveConnector::new(http_client, access_token);
//! ```

mod http;

pub use http::ReqwestHttpClient;
