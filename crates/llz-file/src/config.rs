//! Configuration for the file handle table

use serde::{Deserialize, Serialize};

/// Default number of files that may be open at once
pub const DEFAULT_CAPACITY: usize = 32;

/// Configuration for [`LlzFiles`](crate::LlzFiles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTableConfig {
    /// Maximum number of simultaneously open files
    pub capacity: usize,

    /// Open files read-only when they cannot be opened for writing
    pub read_only_fallback: bool,
}

impl Default for FileTableConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            read_only_fallback: true,
        }
    }
}

impl FileTableConfig {
    /// Create a configuration with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set the maximum number of open files
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enable or disable the read-only fallback on open
    #[must_use]
    pub const fn with_read_only_fallback(mut self, enable: bool) -> Self {
        self.read_only_fallback = enable;
        self
    }
}
