//! Record layout descriptors and positional addressing
//!
//! Every LLZ record stores its fields in the same order:
//!
//! ```text
//! [i32 seconds, i32 nanoseconds]   if the layout has time
//! [i32 uncertainty]                if the layout has uncertainty
//! i32 latitude
//! i32 longitude
//! i32 depth
//! u32 status (V1-V3) | u16 status (V4+)
//! ```
//!
//! Records follow the fixed size header back to back, so the offset of record
//! `n` is `HEADER_SIZE + n * stride`.

use crate::header::HEADER_SIZE;
use crate::version::FormatVersion;

/// Width of every non-status field in bytes
pub const FIELD_WIDTH: usize = 4;

/// Width of the status field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusWidth {
    /// 16-bit status (V4+)
    U16,
    /// 32-bit status (V1-V3)
    U32,
}

impl StatusWidth {
    /// Width in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Field presence and widths for the records of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordLayout {
    /// Records start with seconds and nanoseconds
    pub has_time: bool,
    /// Records carry a scaled uncertainty after the time fields
    pub has_uncertainty: bool,
    /// Width of the trailing status field
    pub status: StatusWidth,
}

impl RecordLayout {
    /// Resolve the layout for a file version and its header flags
    ///
    /// Flags a version cannot represent are ignored: V1 files never carry
    /// time or uncertainty, V2 files never carry uncertainty.
    pub const fn resolve(version: FormatVersion, time_flag: bool, uncertainty_flag: bool) -> Self {
        Self {
            has_time: time_flag && version.supports_time(),
            has_uncertainty: uncertainty_flag && version.supports_uncertainty(),
            status: version.era().status_width(),
        }
    }

    /// Size of one record in bytes
    pub const fn stride(&self) -> usize {
        let mut size = 3 * FIELD_WIDTH + self.status.bytes();
        if self.has_time {
            size += 2 * FIELD_WIDTH;
        }
        if self.has_uncertainty {
            size += FIELD_WIDTH;
        }
        size
    }

    /// Absolute byte offset of record `recnum`
    pub const fn offset(&self, recnum: u32) -> u64 {
        recnum as u64 * self.stride() as u64 + HEADER_SIZE as u64
    }
}

/// Absolute byte offset of record `recnum` for a version and flag combination
pub const fn record_offset(
    version: FormatVersion,
    recnum: u32,
    time_flag: bool,
    uncertainty_flag: bool,
) -> u64 {
    RecordLayout::resolve(version, time_flag, uncertainty_flag).offset(recnum)
}
