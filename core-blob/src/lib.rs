//! # Blob Store
//!
//! Durable, content-addressed storage of file payloads on local disk.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   <last two characters of id>/
//!     <id>==<checksum>
//! ```
//!
//! The layout is a persisted-state contract: offline inspectors and garbage
//! collectors may rely on it.
//!
//! ## Versioning
//!
//! Only the most recently saved checksum of an ID is retained. Saving a new
//! version removes every other variant of the same ID; removal failures are
//! logged and retried implicitly by the next cleanup.
//!
//! ## Concurrency
//!
//! The store performs no locking. Concurrent `save`/`delete` calls for the
//! same ID may race; callers that need ordering serialize per ID themselves.

pub mod error;
pub mod store;

pub use error::{BlobError, Result};
pub use store::{BlobStore, Retain};
