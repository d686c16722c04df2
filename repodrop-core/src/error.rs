//! Error types for repodrop

use thiserror::Error;

/// Result type alias for repodrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for repodrop operations
///
/// Every variant is terminal for the deploy that produced it. The message
/// is meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// The reference string is not a recognizable GitHub repository URL
    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    /// The archive could not be fetched or written to disk
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// The destination directory could not be reset or locked
    #[error("Destination error: {0}")]
    DestinationError(String),

    /// The downloaded bytes are not a usable ZIP archive
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The archive extracted to nothing usable
    #[error("Empty archive: {0}")]
    EmptyArchive(String),

    /// Copying the extracted tree into the destination failed
    #[error("Copy failed: {0}")]
    CopyFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Short, stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "InvalidUrl",
            Error::DownloadFailed(_) => "DownloadFailed",
            Error::DestinationError(_) => "DestinationError",
            Error::CorruptArchive(_) => "CorruptArchive",
            Error::EmptyArchive(_) => "EmptyArchive",
            Error::CopyFailed(_) => "CopyFailed",
            Error::Config(_) => "Config",
        }
    }
}
