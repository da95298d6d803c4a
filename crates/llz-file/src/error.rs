//! Errors for LLZ file sessions

use llz_format::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for LLZ file operations.
pub type Result<T> = std::result::Result<T, LlzError>;

/// Errors that can occur while working with LLZ files.
#[derive(Debug, Error)]
pub enum LlzError {
    /// Every slot of the handle table is in use.
    #[error("Too many open LLZ files (capacity {capacity})")]
    ResourceExhausted {
        /// Configured table capacity
        capacity: usize,
    },

    /// The file does not start with an LLZ header.
    #[error("Not an LLZ file: {}", path.display())]
    NotThisFormat {
        /// Path that was opened
        path: PathBuf,
    },

    /// The handle was closed or never belonged to this table.
    #[error("Stale or unknown LLZ handle (slot {index})")]
    StaleHandle {
        /// Slot index carried by the handle
        index: usize,
    },

    /// Record number outside `[0, record_count)`.
    #[error("Record {recnum} out of range, file has {count} records")]
    RecordOutOfRange {
        /// Requested record
        recnum: u32,
        /// Records in the file
        count: u32,
    },

    /// Invalid argument to an operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Header or record codec error.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
