use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid blob id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid checksum {checksum:?}: {reason}")]
    InvalidChecksum { checksum: String, reason: String },

    #[error("Blob not found: {id}=={checksum}")]
    NotFound { id: String, checksum: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, BlobError>;
