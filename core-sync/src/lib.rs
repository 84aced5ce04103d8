//! # Sync Module
//!
//! Keeps the local metadata replica in step with the remote change feed.
//!
//! ## Components
//!
//! - **Sync Coordinator** (`coordinator`): Scheduler loop, pass execution and change-feed pagination
//! - **Change Merge** (`merge`): Per-item rules turning a change into a save, a delete or a skip
//! - **In-Memory Store** (`memory`): `MetadataStore` backed by process memory
//!
//! Outbound (local to remote) sync is not supported yet.

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod merge;

pub use coordinator::{change_query, SyncConfig, SyncCoordinator, SyncReport};
pub use error::{Result, SyncError};
pub use memory::{InMemoryMetadataStore, StoredRecord};
pub use merge::{ChangeMerger, MergeOutcome};
