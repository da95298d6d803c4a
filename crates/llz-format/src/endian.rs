//! Byte order of record data on disk
//!
//! LLZ files declare the byte order of their records in the `[ENDIAN]` header
//! key. Records are always decoded through [`ByteOrder::endian`], so a file
//! written on an opposite-endian machine reads back to the same values.

use std::fmt;
use std::str::FromStr;

/// Byte order of the binary records in an LLZ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first (`[ENDIAN] = BIG`)
    Big,
    /// Least significant byte first (`[ENDIAN] = LITTLE`)
    Little,
}

impl ByteOrder {
    /// Byte order of the running machine
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns the opposite byte order
    pub const fn swapped(self) -> Self {
        match self {
            Self::Big => Self::Little,
            Self::Little => Self::Big,
        }
    }

    /// Whether values must be byte swapped between file and runtime order
    pub const fn needs_swap(self) -> bool {
        !matches!(
            (self, Self::native()),
            (Self::Big, Self::Big) | (Self::Little, Self::Little)
        )
    }

    /// Endian parameter for `binrw` reads and writes
    pub const fn endian(self) -> binrw::Endian {
        match self {
            Self::Big => binrw::Endian::Big,
            Self::Little => binrw::Endian::Little,
        }
    }

    /// Header keyword for this byte order
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Big => "BIG",
            Self::Little => "LITTLE",
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = ();

    /// Matches the header keyword anywhere in the value, like `BIG ENDIAN`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if upper.contains("LITTLE") {
            Ok(Self::Little)
        } else if upper.contains("BIG") {
            Ok(Self::Big)
        } else {
            Err(())
        }
    }
}
