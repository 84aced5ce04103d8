//! # Change Merge
//!
//! Applies one change-feed item to the metadata store.
//!
//! ## Rules
//!
//! - A deleted or trashed item removes the record with the change's file ID.
//! - A live item without a download reference is skipped unless it is a
//!   folder. Folders carry no payload but still anchor the tree.
//! - The first listed parent becomes the record's parent. When that parent is
//!   the remote account's root it is remapped to [`ROOT_FOLDER_ID`].
//! - Records are stamped with the injected clock's current time. The remote
//!   modification time is not parsed.

use crate::error::{Result, SyncError};
use bridge_traits::{Change, Clock, MetadataRecord, MetadataStore, RemoteFile, ROOT_FOLDER_ID};
use tracing::{debug, warn};

/// What merging a single change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Saved,
    Deleted,
    Skipped,
}

/// Merges change items against one metadata store
pub struct ChangeMerger<'a> {
    metadata: &'a dyn MetadataStore,
    clock: &'a dyn Clock,
    remote_root_id: &'a str,
}

impl<'a> ChangeMerger<'a> {
    /// `remote_root_id` is the ID the remote reports for its own root folder.
    pub fn new(
        metadata: &'a dyn MetadataStore,
        clock: &'a dyn Clock,
        remote_root_id: &'a str,
    ) -> Self {
        Self {
            metadata,
            clock,
            remote_root_id,
        }
    }

    pub async fn merge(&self, change: &Change) -> Result<MergeOutcome> {
        if change.file_id.is_empty() {
            return Err(SyncError::InvalidChange {
                change_id: change.id,
                reason: "missing file id".to_string(),
            });
        }

        if change.is_removal() {
            self.metadata
                .delete(&change.file_id)
                .await
                .map_err(SyncError::metadata)?;
            debug!(change_id = change.id, file_id = %change.file_id, "Removed record");
            return Ok(MergeOutcome::Deleted);
        }

        let Some(file) = change.file.as_ref() else {
            warn!(
                change_id = change.id,
                file_id = %change.file_id,
                "Change carries no file payload, skipping"
            );
            return Ok(MergeOutcome::Skipped);
        };

        if file.download_ref.is_none() && !file.is_folder() {
            debug!(
                change_id = change.id,
                file_id = %change.file_id,
                mime_type = %file.mime_type,
                "No downloadable content, skipping"
            );
            return Ok(MergeOutcome::Skipped);
        }

        let parent_id = resolve_parent(file, self.remote_root_id);
        let record = build_record(&change.file_id, &parent_id, file, self.clock);
        let is_leaf = !record.is_folder();

        self.metadata
            .save(&parent_id, &change.file_id, record, is_leaf, false)
            .await
            .map_err(SyncError::metadata)?;

        debug!(
            change_id = change.id,
            file_id = %change.file_id,
            parent_id = %parent_id,
            is_leaf,
            "Saved record"
        );
        Ok(MergeOutcome::Saved)
    }
}

/// First listed parent, with the remote root remapped to [`ROOT_FOLDER_ID`]
pub fn resolve_parent(file: &RemoteFile, remote_root_id: &str) -> String {
    match file.parents.first() {
        Some(parent) if parent == remote_root_id => ROOT_FOLDER_ID.to_string(),
        Some(parent) => parent.clone(),
        None => String::new(),
    }
}

/// Record for `file` stored under `id`
pub fn build_record(
    id: &str,
    parent_id: &str,
    file: &RemoteFile,
    clock: &dyn Clock,
) -> MetadataRecord {
    MetadataRecord {
        id: id.to_string(),
        parent_id: parent_id.to_string(),
        name: file.title.clone(),
        mime_type: file.mime_type.clone(),
        size: file.size,
        checksum: file.checksum.clone().unwrap_or_default(),
        last_modified: clock.now(),
    }
}
