//! # Sync Coordinator
//!
//! Reconciles the local metadata store against the remote change feed.
//!
//! ## Overview
//!
//! The `SyncCoordinator` owns the sync loop and the pass algorithm. It reads
//! and writes the replica tree through a [`MetadataStore`] and talks to the
//! remote through a [`RemoteDrive`]. It never touches blob content.
//!
//! ## Workflow
//!
//! ### Pass
//! 1. Resolve the resume point: zero when forced or when the stored cursor
//!    cannot be read, otherwise cursor + 1. A zero resume point makes the
//!    pass an initial sync.
//! 2. Fetch the remote root and save it under [`ROOT_FOLDER_ID`] on every pass
//! 3. Fetch one page of changes, merge its items in feed order, then persist
//!    the largest change ID of the page
//! 4. Repeat with the returned page token until the feed is exhausted
//!
//! Any error aborts the pass. Cursors saved for earlier pages stay valid, so
//! the next pass resumes right after the last fully merged page.
//!
//! ### Scheduling
//! [`SyncCoordinator::start`] runs a pass, waits for the configured interval
//! and repeats. Passes never overlap: the scheduled loop and callers of
//! [`SyncCoordinator::sync`] share one lock.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncConfig, SyncCoordinator};
//! use std::sync::Arc;
//!
//! let coordinator = Arc::new(SyncCoordinator::new(SyncConfig::default(), remote, metadata));
//! let handle = Arc::clone(&coordinator).start();
//!
//! // Forced resync from a foreground caller
//! let report = coordinator.sync(true).await?;
//! println!("saved {} records", report.saved);
//! ```

use crate::error::{Result, SyncError};
use crate::merge::{ChangeMerger, MergeOutcome};
use bridge_traits::{
    ChangePosition, ChangeQuery, Clock, MetadataRecord, MetadataStore, NextPage, RemoteDrive,
    RemoteFile, SystemClock, ROOT_FOLDER_ID,
};
use core_runtime::config::{ReplicaConfig, DEFAULT_SYNC_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Sync coordinator configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between the end of one scheduled pass and the start of the next
    pub interval: Duration,

    /// Whether the first scheduled pass ignores the stored cursor
    pub force_initial_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SYNC_INTERVAL,
            force_initial_sync: false,
        }
    }
}

impl From<&ReplicaConfig> for SyncConfig {
    fn from(config: &ReplicaConfig) -> Self {
        Self {
            interval: config.sync_interval,
            force_initial_sync: config.force_initial_sync,
        }
    }
}

/// Summary of one successful pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Whether the pass started from scratch
    pub initial: bool,
    /// Change pages fetched
    pub pages: usize,
    /// Records saved, not counting the root
    pub saved: usize,
    /// Records removed
    pub deleted: usize,
    /// Change items that were not persisted
    pub skipped: usize,
    /// Last cursor persisted by this pass, if any page advanced it
    pub largest_change_id: Option<i64>,
}

/// Sync coordinator for the inbound change feed
pub struct SyncCoordinator {
    config: SyncConfig,
    remote: Arc<dyn RemoteDrive>,
    metadata: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    pass_lock: Mutex<()>,
}

impl SyncCoordinator {
    pub fn new(
        config: SyncConfig,
        remote: Arc<dyn RemoteDrive>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            config,
            remote,
            metadata,
            clock: Arc::new(SystemClock),
            pass_lock: Mutex::new(()),
        }
    }

    /// Coordinator wired from a validated replica configuration
    pub fn from_config(config: &ReplicaConfig) -> Self {
        Self::new(
            SyncConfig::from(config),
            Arc::clone(&config.remote_drive),
            Arc::clone(&config.metadata_store),
        )
        .with_clock(Arc::clone(&config.clock))
    }

    /// Replace the time source used to stamp records
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Spawn the scheduler loop on the current Tokio runtime.
    ///
    /// Pass failures are logged and the loop keeps going. Abort the returned
    /// handle to stop it.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            force_initial_sync = self.config.force_initial_sync,
            "Starting sync scheduler"
        );

        tokio::spawn(async move {
            let mut force = self.config.force_initial_sync;
            loop {
                if let Err(e) = self.sync(force).await {
                    error!(error = %e, "Sync pass failed, retrying at next tick");
                }
                force = false;
                tokio::time::sleep(self.config.interval).await;
            }
        })
    }

    /// Run one inbound pass.
    ///
    /// Waits for an in-flight pass to finish first. With `force` set the
    /// stored cursor is ignored and the whole feed is replayed.
    #[instrument(skip(self))]
    pub async fn sync(&self, force: bool) -> Result<SyncReport> {
        let _guard = self.pass_lock.lock().await;

        info!("Sync pass started");
        let report = self.sync_inbound(force).await?;
        info!(
            initial = report.initial,
            pages = report.pages,
            saved = report.saved,
            deleted = report.deleted,
            skipped = report.skipped,
            largest_change_id = ?report.largest_change_id,
            "Sync pass finished"
        );

        Ok(report)
    }

    /// Push local changes to the remote.
    ///
    /// Not supported yet; always fails with [`SyncError::Unsupported`].
    pub async fn sync_outbound(
        &self,
        root_id: &str,
        recursive: bool,
        force: bool,
    ) -> Result<SyncReport> {
        debug!(root_id, recursive, force, "Outbound sync requested");
        Err(SyncError::Unsupported {
            operation: "outbound sync".to_string(),
        })
    }

    async fn sync_inbound(&self, force: bool) -> Result<SyncReport> {
        let resume_from = self.resume_point(force).await;
        let mut report = SyncReport {
            initial: resume_from == 0,
            ..Default::default()
        };

        let root = self
            .remote
            .get_file(ROOT_FOLDER_ID)
            .await
            .map_err(SyncError::provider)?;
        self.save_root(&root).await?;

        let mut page_token = None;
        loop {
            let next = self
                .merge_changes(&mut report, &root.id, resume_from, page_token.take())
                .await?;

            match next {
                NextPage::Token(token) => page_token = Some(token),
                NextPage::Exhausted => break,
            }
        }

        Ok(report)
    }

    async fn resume_point(&self, force: bool) -> i64 {
        if force {
            return 0;
        }

        match self.metadata.largest_change_id().await {
            Ok(cursor) => cursor.saturating_add(1),
            Err(e) => {
                debug!(error = %e, "No readable cursor, syncing from scratch");
                0
            }
        }
    }

    async fn save_root(&self, root: &RemoteFile) -> Result<()> {
        let record = MetadataRecord {
            id: ROOT_FOLDER_ID.to_string(),
            parent_id: String::new(),
            name: root.title.clone(),
            mime_type: root.mime_type.clone(),
            size: root.size,
            checksum: root.checksum.clone().unwrap_or_default(),
            last_modified: self.clock.now(),
        };

        self.metadata
            .save("", ROOT_FOLDER_ID, record, false, false)
            .await
            .map_err(SyncError::metadata)?;

        debug!(remote_root_id = %root.id, "Saved root record");
        Ok(())
    }

    #[instrument(skip(self, report, page_token), fields(page = report.pages + 1))]
    async fn merge_changes(
        &self,
        report: &mut SyncReport,
        remote_root_id: &str,
        start_change_id: i64,
        page_token: Option<String>,
    ) -> Result<NextPage> {
        let query = change_query(report.initial, start_change_id, page_token);
        debug!(
            position = ?query.position,
            include_deleted = query.include_deleted,
            "Fetching changes"
        );

        let page = self
            .remote
            .list_changes(&query)
            .await
            .map_err(SyncError::provider)?;
        report.pages += 1;

        let merger =
            ChangeMerger::new(self.metadata.as_ref(), self.clock.as_ref(), remote_root_id);
        let mut largest_id = 0;

        for change in &page.items {
            match merger.merge(change).await? {
                MergeOutcome::Saved => report.saved += 1,
                MergeOutcome::Deleted => report.deleted += 1,
                MergeOutcome::Skipped => report.skipped += 1,
            }
            largest_id = largest_id.max(change.id);
        }

        if largest_id > 0 {
            self.metadata
                .save_largest_change_id(largest_id)
                .await
                .map_err(SyncError::metadata)?;
            report.largest_change_id = Some(largest_id);
        } else if !page.items.is_empty() {
            warn!(items = page.items.len(), "Page carried no positive change id");
        }

        debug!(
            items = page.items.len(),
            largest_change_id = largest_id,
            more = matches!(page.next, NextPage::Token(_)),
            "Merged change page"
        );

        Ok(page.next)
    }
}

/// Request for one change page.
///
/// A page token always wins over the start change ID. Tombstones are
/// excluded on an initial sync since nothing exists locally yet.
pub fn change_query(
    initial: bool,
    start_change_id: i64,
    page_token: Option<String>,
) -> ChangeQuery {
    let position = match page_token {
        Some(token) => ChangePosition::PageToken(token),
        None if start_change_id > 0 => ChangePosition::StartChangeId(start_change_id),
        None => ChangePosition::Beginning,
    };

    ChangeQuery {
        position,
        include_deleted: !initial,
        include_subscribed: false,
    }
}
