//! Error types for LLZ header and record codecs

use thiserror::Error;

/// Errors that can occur when parsing or building LLZ headers and records
#[derive(Debug, Error)]
pub enum FormatError {
    /// The version string carries no `V<major>.<minor>` token
    #[error("Missing version token in {0:?}")]
    MissingVersion(String),

    /// The token after `V` is not a number
    #[error("Invalid version number {token:?} in {version:?}")]
    InvalidVersion {
        /// Full version string
        version: String,
        /// Token that failed to parse
        token: String,
    },

    /// Header text does not fit in the fixed header block
    #[error("Header too large: {size} bytes exceeds {limit}")]
    HeaderTooLarge {
        /// Serialized size of the header text
        size: usize,
        /// Fixed header block size
        limit: usize,
    },

    /// Header block ended before the end-of-header marker
    #[error("Header has no [END OF HEADER] marker")]
    MissingEndOfHeader,

    /// A numeric header value could not be parsed
    #[error("Invalid value for [{key}]: {value:?}")]
    InvalidHeaderValue {
        /// Header key
        key: String,
        /// Raw value text
        value: String,
    },

    /// Record buffer is shorter than the layout stride
    #[error("Truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        /// Stride of the record layout
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// `BinRw` parsing/writing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// IO error during parsing or building
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for LLZ format operations
pub type Result<T> = std::result::Result<T, FormatError>;
