//! # Bridge Traits
//!
//! Collaborator contracts that the replica core depends on but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`RemoteDrive`](remote::RemoteDrive) - Remote file metadata and paginated change feed
//! - [`MetadataStore`](metadata::MetadataStore) - Local tree persistence and change watermark
//! - [`HttpClient`](http::HttpClient) - Transport used by remote providers
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations convert their own failures into it and keep the message
//! actionable (file IDs, HTTP status, paths).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so that a single implementation can
//! be shared between the sync scheduler and foreground callers.

pub mod error;
pub mod http;
pub mod metadata;
pub mod remote;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use metadata::{MetadataRecord, MetadataStore, ROOT_FOLDER_ID};
pub use remote::{
    Change, ChangePage, ChangePosition, ChangeQuery, NextPage, RemoteDrive, RemoteFile,
    FOLDER_MIME_TYPE,
};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
