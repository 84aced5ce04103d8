//! Metadata Store Abstraction
//!
//! Contract for the local persistence of the replica's tree: one record per
//! remote entry plus the change-feed watermark.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::remote::FOLDER_MIME_TYPE;

/// Local ID of the replica root
///
/// The remote root is always stored under this ID, whatever the remote
/// account reports as its own root ID. The remote also accepts it as an alias
/// when fetching the root folder.
pub const ROOT_FOLDER_ID: &str = "root";

/// Locally persisted metadata of one remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: String,

    /// Parent ID, [`ROOT_FOLDER_ID`] for top-level entries, empty for the root
    pub parent_id: String,

    pub name: String,

    pub mime_type: String,

    pub size: i64,

    /// Content checksum, empty when the remote reports none
    pub checksum: String,

    pub last_modified: DateTime<Utc>,
}

impl MetadataRecord {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Metadata store trait
///
/// # Contract
///
/// - `delete` of an unknown ID succeeds without effect.
/// - `largest_change_id` fails when no watermark was ever saved; callers
///   treat that as "sync from scratch".
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Highest change ID fully applied to this store
    async fn largest_change_id(&self) -> Result<i64>;

    /// Persist the change-feed watermark
    async fn save_largest_change_id(&self, change_id: i64) -> Result<()>;

    /// Insert or replace a record
    ///
    /// `is_leaf` is false for folders. `local_flag` is interpreted by the
    /// store alone; the sync engine always passes `false`.
    async fn save(
        &self,
        parent_id: &str,
        id: &str,
        record: MetadataRecord,
        is_leaf: bool,
        local_flag: bool,
    ) -> Result<()>;

    /// Remove a record
    async fn delete(&self, id: &str) -> Result<()>;
}
