//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`ReplicaConfig`] into the two halves of the
//! replica: the on-disk [`BlobStore`] and the [`SyncCoordinator`] that keeps
//! the metadata tree in step with the remote change feed. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop` and `provider-google-drive`) to build the remote
//! collaborator from an access token.
//!
//! ```ignore
//! use core_runtime::ReplicaConfig;
//! use core_service::{google_drive_remote, ReplicaService};
//! use core_sync::InMemoryMetadataStore;
//! use std::sync::Arc;
//!
//! let config = ReplicaConfig::builder()
//!     .blob_dir("/var/lib/replica/blobs")
//!     .remote_drive(google_drive_remote(access_token)?)
//!     .metadata_store(Arc::new(InMemoryMetadataStore::new()))
//!     .build()?;
//!
//! let service = ReplicaService::new(config).await?;
//! let scheduler = service.start();
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_blob::BlobStore;
use core_runtime::ReplicaConfig;
use core_sync::{SyncCoordinator, SyncReport};
use tokio::task::JoinHandle;
use tracing::info;

#[cfg(feature = "desktop-shims")]
use bridge_traits::RemoteDrive;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct ReplicaService {
    blobs: Arc<BlobStore>,
    coordinator: Arc<SyncCoordinator>,
}

impl ReplicaService {
    /// Create the service, creating the blob directory if needed.
    pub async fn new(config: ReplicaConfig) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.blob_dir)
            .await
            .map_err(|e| {
                CoreError::InitializationFailed(format!(
                    "Failed to create blob directory {}: {}",
                    config.blob_dir.display(),
                    e
                ))
            })?;

        let blobs = Arc::new(BlobStore::new(config.blob_dir.clone()));
        let coordinator = Arc::new(SyncCoordinator::from_config(&config));

        info!(
            blob_dir = %config.blob_dir.display(),
            sync_interval_secs = config.sync_interval.as_secs_f64(),
            "Replica service initialized"
        );

        Ok(Self { blobs, coordinator })
    }

    /// Spawn the background sync loop.
    ///
    /// Must be called from within a Tokio runtime. Abort the returned handle
    /// to stop scheduling.
    pub fn start(&self) -> JoinHandle<()> {
        Arc::clone(&self.coordinator).start()
    }

    /// Run a sync pass now, waiting for any pass already in flight.
    pub async fn sync_now(&self, force: bool) -> Result<SyncReport> {
        Ok(self.coordinator.sync(force).await?)
    }

    /// Blob store rooted at the configured blob directory.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn coordinator(&self) -> Arc<SyncCoordinator> {
        Arc::clone(&self.coordinator)
    }
}

/// Google Drive change feed over the desktop HTTP client.
#[cfg(feature = "desktop-shims")]
pub fn google_drive_remote(access_token: impl Into<String>) -> Result<Arc<dyn RemoteDrive>> {
    let http_client = bridge_desktop::ReqwestHttpClient::new()
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;

    Ok(Arc::new(provider_google_drive::GoogleDriveConnector::new(
        Arc::new(http_client),
        access_token,
    )))
}
