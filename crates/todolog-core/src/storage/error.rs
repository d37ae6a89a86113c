//! Storage error handling
//!
//! Typed errors for log file operations with descriptive messages and
//! recovery suggestions. The store never returns these to its caller
//! directly; they travel inside [`crate::Event::IoError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The file operation that failed, used to classify I/O errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Open,
    Read,
    Write,
    Sync,
}

/// Errors from encoding or decoding log records
#[derive(Error, Debug)]
pub enum CodecError {
    /// The event has no on-disk representation
    #[error("unsupported event type {0:?}")]
    UnsupportedType(&'static str),

    /// Malformed, truncated or out-of-order record
    #[error("decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The underlying writer failed
    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to open or create the log file
    #[error("Failed to open '{path}': {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to sync file to disk
    #[error("Failed to sync '{path}': {source}")]
    SyncError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Replay hit a record it could not decode; nothing after it was loaded
    #[error("Corrupt record in '{path}' at byte {offset}: {source}")]
    Corrupt {
        path: PathBuf,
        offset: usize,
        #[source]
        source: CodecError,
    },

    /// Event could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The log has already been closed
    #[error("Event log is closed")]
    Closed,

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    /// and falls back to the failing operation.
    pub fn from_io(error: io::Error, path: PathBuf, op: FileOp) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => match op {
                FileOp::Open => StoreError::OpenFile {
                    path,
                    source: error,
                },
                FileOp::Read => StoreError::ReadError {
                    path,
                    source: error,
                },
                FileOp::Write => StoreError::WriteError {
                    path,
                    source: error,
                },
                FileOp::Sync => StoreError::SyncError {
                    path,
                    source: error,
                },
            },
        }
    }

    /// Check if retrying after user action may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::DiskFull { .. }
                | StoreError::PermissionDenied { .. }
                | StoreError::CreateDirectory { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions of the data directory.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::Corrupt { .. } => Some(
                "Records after the reported offset were not loaded. Inspect events.json manually.",
            ),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
