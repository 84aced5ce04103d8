use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Invalid change {change_id}: {reason}")]
    InvalidChange { change_id: i64, reason: String },
}

impl SyncError {
    pub(crate) fn provider(err: BridgeError) -> Self {
        SyncError::Provider(err.to_string())
    }

    pub(crate) fn metadata(err: BridgeError) -> Self {
        SyncError::Metadata(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
