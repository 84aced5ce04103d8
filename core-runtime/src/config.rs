//! # Replica Configuration Module
//!
//! Configuration management for the drive replica.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ReplicaConfig` holding the injected collaborators and the settings of the
//! blob store and the sync scheduler. It enforces fail-fast validation so that
//! a missing collaborator is reported at startup rather than on the first
//! sync pass.
//!
//! ## Required Dependencies
//!
//! - `RemoteDrive` - Change feed and file metadata of the remote store
//! - `MetadataStore` - Local persistence of the replica tree
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Time source (default: `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ReplicaConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = ReplicaConfig::builder()
//!     .blob_dir("/var/lib/replica/blobs")
//!     .sync_interval(Duration::from_secs(60))
//!     .remote_drive(Arc::new(connector))
//!     .metadata_store(Arc::new(store))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, MetadataStore, RemoteDrive, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default delay between two scheduled sync passes
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound accepted for the sync interval
pub const MAX_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration of a drive replica.
///
/// Use [`ReplicaConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ReplicaConfig {
    /// Root directory of the blob store
    pub blob_dir: PathBuf,

    /// Delay between the end of one scheduled pass and the start of the next
    pub sync_interval: Duration,

    /// Run the first scheduled pass as a full resync
    pub force_initial_sync: bool,

    /// Remote change feed (required)
    pub remote_drive: Arc<dyn RemoteDrive>,

    /// Local metadata persistence (required)
    pub metadata_store: Arc<dyn MetadataStore>,

    /// Time source for record timestamps
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ReplicaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaConfig")
            .field("blob_dir", &self.blob_dir)
            .field("sync_interval", &self.sync_interval)
            .field("force_initial_sync", &self.force_initial_sync)
            .field("remote_drive", &"RemoteDrive { ... }")
            .field("metadata_store", &"MetadataStore { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl ReplicaConfig {
    /// Creates a new builder for constructing a `ReplicaConfig`.
    pub fn builder() -> ReplicaConfigBuilder {
        ReplicaConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Blob directory is not empty
    /// - Sync interval is non-zero and at most one day
    pub fn validate(&self) -> Result<()> {
        if self.blob_dir.as_os_str().is_empty() {
            return Err(Error::Config("Blob directory cannot be empty".to_string()));
        }

        if self.sync_interval.is_zero() {
            return Err(Error::Config(
                "Sync interval must be greater than zero".to_string(),
            ));
        }

        if self.sync_interval > MAX_SYNC_INTERVAL {
            return Err(Error::Config(format!(
                "Sync interval exceeds maximum of {} seconds",
                MAX_SYNC_INTERVAL.as_secs()
            )));
        }

        Ok(())
    }
}

fn remote_drive_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "RemoteDrive".to_string(),
        message: "A RemoteDrive implementation is required to read the change feed. \
                 Desktop: construct provider_google_drive::GoogleDriveConnector with a \
                 bridge_desktop::ReqwestHttpClient and an OAuth access token."
            .to_string(),
    }
}

fn metadata_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MetadataStore".to_string(),
        message: "A MetadataStore implementation is required to persist the replica tree. \
                 Inject the host's database-backed store, or core_sync::InMemoryMetadataStore \
                 for ephemeral replicas."
            .to_string(),
    }
}

/// Builder for constructing [`ReplicaConfig`] instances.
#[derive(Default)]
pub struct ReplicaConfigBuilder {
    blob_dir: Option<PathBuf>,
    sync_interval: Option<Duration>,
    force_initial_sync: bool,
    remote_drive: Option<Arc<dyn RemoteDrive>>,
    metadata_store: Option<Arc<dyn MetadataStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ReplicaConfigBuilder {
    /// Sets the blob store root directory (required).
    pub fn blob_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.blob_dir = Some(path.into());
        self
    }

    /// Sets the delay between scheduled sync passes.
    ///
    /// Default: 30 seconds
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Makes the first scheduled pass ignore the persisted cursor.
    ///
    /// Default: false
    pub fn force_initial_sync(mut self, force: bool) -> Self {
        self.force_initial_sync = force;
        self
    }

    /// Sets the remote drive implementation (required).
    pub fn remote_drive(mut self, remote: Arc<dyn RemoteDrive>) -> Self {
        self.remote_drive = Some(remote);
        self
    }

    /// Sets the metadata store implementation (required).
    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata_store = Some(store);
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `ReplicaConfig` instance.
    ///
    /// Returns an error if a required field or collaborator is missing or a
    /// value is out of range.
    pub fn build(self) -> Result<ReplicaConfig> {
        let blob_dir = self.blob_dir.ok_or_else(|| {
            Error::Config("Blob directory is required. Use .blob_dir() to set it.".to_string())
        })?;

        let remote_drive = self.remote_drive.ok_or_else(remote_drive_missing_error)?;
        let metadata_store = self
            .metadata_store
            .ok_or_else(metadata_store_missing_error)?;

        let config = ReplicaConfig {
            blob_dir,
            sync_interval: self.sync_interval.unwrap_or(DEFAULT_SYNC_INTERVAL),
            force_initial_sync: self.force_initial_sync,
            remote_drive,
            metadata_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}
