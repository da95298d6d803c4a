//! LLZ format version parsing and era resolution
//!
//! The `[VERSION]` header value looks like
//! `PFM Software - llz library V4.03 - 07/21/2014`. Only the major number
//! matters for the record layout:
//!
//! - **V1** (major < 2): lat/lon/depth/status, 32-bit status
//! - **V2_3** (major 2-3): optional time, uncertainty only in V3, 32-bit status
//! - **V4Plus** (major >= 4): optional time and uncertainty, 16-bit status

use crate::error::{FormatError, Result};
use crate::layout::StatusWidth;
use std::fmt;

/// Signature every LLZ header carries in its version line
pub const SIGNATURE: &str = "llz library V";

/// Version string written into newly created files
pub const LIBRARY_VERSION: &str = "PFM Software - llz library V4.03 - 07/21/2014";

/// On-disk record layout era
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatEra {
    /// Version 1.x: no time, no uncertainty, 32-bit status
    V1,
    /// Versions 2.x and 3.x: optional time, V3-only uncertainty, 32-bit status
    V2_3,
    /// Version 4.x and later: optional time and uncertainty, 16-bit status
    V4Plus,
}

impl FormatEra {
    /// Resolve the era from a major version number
    pub const fn from_major(major: u16) -> Self {
        match major {
            0 | 1 => Self::V1,
            2 | 3 => Self::V2_3,
            _ => Self::V4Plus,
        }
    }

    /// Width of the status field
    pub const fn status_width(self) -> StatusWidth {
        match self {
            Self::V1 | Self::V2_3 => StatusWidth::U32,
            Self::V4Plus => StatusWidth::U16,
        }
    }
}

impl fmt::Display for FormatEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "V1 (lat/lon/depth only)"),
            Self::V2_3 => write!(f, "V2-V3 (32-bit status)"),
            Self::V4Plus => write!(f, "V4+ (16-bit status)"),
        }
    }
}

/// Parsed `V<major>.<minor>` version of an LLZ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatVersion {
    /// Major version, selects the record layout
    pub major: u16,
    /// Minor version, informational only
    pub minor: u16,
}

impl FormatVersion {
    /// Create a version from its components
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Version written by this library
    pub const fn current() -> Self {
        Self::new(4, 3)
    }

    /// Parse the version out of a `[VERSION]` header value
    ///
    /// The number following the `V` of [`SIGNATURE`] is used when present,
    /// otherwise the first `V` directly followed by a digit. The number runs
    /// up to the next space.
    pub fn parse(version: &str) -> Result<Self> {
        let start = version
            .find(SIGNATURE)
            .map(|pos| pos + SIGNATURE.len())
            .or_else(|| {
                version
                    .char_indices()
                    .zip(version.chars().skip(1))
                    .find(|((_, c), next)| *c == 'V' && next.is_ascii_digit())
                    .map(|((pos, _), _)| pos + 1)
            })
            .ok_or_else(|| FormatError::MissingVersion(version.to_string()))?;

        let token = version[start..]
            .split_whitespace()
            .next()
            .unwrap_or_default();

        let invalid = || FormatError::InvalidVersion {
            version: version.to_string(),
            token: token.to_string(),
        };

        let (major, minor) = token.split_once('.').unwrap_or((token, "0"));
        let major = major.parse::<u16>().map_err(|_| invalid())?;

        // Minor is informational; "03" and "3a" both count, garbage counts as 0
        let minor = minor
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse::<u16>()
            .unwrap_or(0);

        Ok(Self { major, minor })
    }

    /// Record layout era for this version
    pub const fn era(self) -> FormatEra {
        FormatEra::from_major(self.major)
    }

    /// Whether records may carry an uncertainty field
    ///
    /// V1 never does, V2 ignores the flag, V3 and later honor it.
    pub const fn supports_uncertainty(self) -> bool {
        match self.era() {
            FormatEra::V1 => false,
            FormatEra::V2_3 => self.major == 3,
            FormatEra::V4Plus => true,
        }
    }

    /// Whether records may carry a timestamp
    pub const fn supports_time(self) -> bool {
        !matches!(self.era(), FormatEra::V1)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}.{:02}", self.major, self.minor)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_library_version() {
        let version = FormatVersion::parse(LIBRARY_VERSION).expect("library version parses");
        assert_eq!(version, FormatVersion::new(4, 3));
        assert_eq!(version, FormatVersion::current());
        assert_eq!(version.era(), FormatEra::V4Plus);
    }

    #[test]
    fn test_parse_legacy_versions() {
        let v1 = FormatVersion::parse("PFM Software - llz library V1.00 - 08/31/06").unwrap();
        assert_eq!(v1, FormatVersion::new(1, 0));
        assert_eq!(v1.era(), FormatEra::V1);

        let v2 = FormatVersion::parse("PFM Software - llz library V2.09 - 02/29/12").unwrap();
        assert_eq!(v2.era(), FormatEra::V2_3);
        assert!(!v2.supports_uncertainty());
        assert!(v2.supports_time());

        let v3 = FormatVersion::parse("PFM Software - llz library V3.00 - 06/07/12").unwrap();
        assert_eq!(v3.era(), FormatEra::V2_3);
        assert!(v3.supports_uncertainty());
    }

    #[test]
    fn test_parse_without_signature() {
        let version = FormatVersion::parse("Some Tool V12.5 - today").unwrap();
        assert_eq!(version, FormatVersion::new(12, 5));
        assert_eq!(version.era(), FormatEra::V4Plus);

        // A 'V' that is not followed by a digit is skipped
        let version = FormatVersion::parse("Vendor V2 build").unwrap();
        assert_eq!(version, FormatVersion::new(2, 0));
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            FormatVersion::parse("no version here"),
            Err(FormatError::MissingVersion(_))
        ));
        assert!(matches!(
            FormatVersion::parse("llz library Vx.1 - date"),
            Err(FormatError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_era_boundaries() {
        assert_eq!(FormatEra::from_major(0), FormatEra::V1);
        assert_eq!(FormatEra::from_major(1), FormatEra::V1);
        assert_eq!(FormatEra::from_major(2), FormatEra::V2_3);
        assert_eq!(FormatEra::from_major(3), FormatEra::V2_3);
        assert_eq!(FormatEra::from_major(4), FormatEra::V4Plus);
        assert_eq!(FormatEra::from_major(9), FormatEra::V4Plus);

        assert_eq!(FormatEra::V1.status_width(), StatusWidth::U32);
        assert_eq!(FormatEra::V2_3.status_width(), StatusWidth::U32);
        assert_eq!(FormatEra::V4Plus.status_width().bytes(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(FormatVersion::new(4, 3).to_string(), "V4.03");
        assert_eq!(FormatVersion::new(1, 0).to_string(), "V1.00");
    }
}
