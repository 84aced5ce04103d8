use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
