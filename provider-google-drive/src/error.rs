//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Access token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failure before any response arrived
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::FileNotFound { file_id } => BridgeError::NotFound(file_id),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
