//! In-memory metadata store
//!
//! A [`MetadataStore`] kept entirely in process memory. Hosts that embed the
//! sync engine without a database use it for ephemeral replicas, and tests use
//! it to inspect what a pass persisted.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{MetadataRecord, MetadataStore};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A record together with the flags it was saved with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub parent_id: String,
    pub record: MetadataRecord,
    pub is_leaf: bool,
    pub local_flag: bool,
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, StoredRecord>,
    largest_change_id: Option<i64>,
}

/// Map-backed [`MetadataStore`]
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    state: Mutex<State>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds a change watermark
    pub fn with_largest_change_id(change_id: i64) -> Self {
        Self {
            state: Mutex::new(State {
                records: HashMap::new(),
                largest_change_id: Some(change_id),
            }),
        }
    }

    pub async fn get(&self, id: &str) -> Option<StoredRecord> {
        self.state.lock().await.records.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.lock().await.records.contains_key(id)
    }

    /// Saved watermark, `None` if nothing was ever saved
    pub async fn cursor(&self) -> Option<i64> {
        self.state.lock().await.largest_change_id
    }

    /// IDs of all records, sorted
    pub async fn ids(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state.records.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn largest_change_id(&self) -> Result<i64> {
        self.state
            .lock()
            .await
            .largest_change_id
            .ok_or_else(|| BridgeError::NotFound("largest change id".to_string()))
    }

    async fn save_largest_change_id(&self, change_id: i64) -> Result<()> {
        self.state.lock().await.largest_change_id = Some(change_id);
        Ok(())
    }

    async fn save(
        &self,
        parent_id: &str,
        id: &str,
        record: MetadataRecord,
        is_leaf: bool,
        local_flag: bool,
    ) -> Result<()> {
        let stored = StoredRecord {
            parent_id: parent_id.to_string(),
            record,
            is_leaf,
            local_flag,
        };
        self.state.lock().await.records.insert(id.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.state.lock().await.records.remove(id);
        Ok(())
    }
}
