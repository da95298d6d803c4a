//! LLZ ASCII header block
//!
//! Every LLZ file starts with a [`HEADER_SIZE`] byte block of `[KEY] = value`
//! lines terminated by `[END OF HEADER]` and padded with zero bytes. The
//! header carries the format version, the optional-field flags, the depth
//! units, the byte order of the records and free-text provenance fields.

use crate::endian::ByteOrder;
use crate::error::{FormatError, Result};
use crate::layout::RecordLayout;
use crate::version::{FormatVersion, LIBRARY_VERSION, SIGNATURE};
use std::fmt::{self, Write as _};

/// Size of the header block in bytes
pub const HEADER_SIZE: usize = 16_384;

/// Number of leading bytes checked for [`SIGNATURE`] before parsing
pub const PROBE_SIZE: usize = 128;

/// Line terminating the header text
pub const END_OF_HEADER: &str = "[END OF HEADER]";

/// Units of the depth values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthUnits {
    /// Meters (default)
    #[default]
    Meters,
    /// Feet
    Feet,
    /// Fathoms
    Fathoms,
    /// Roman cubits
    Cubits,
    /// Willetts
    Willetts,
}

impl DepthUnits {
    /// Map a numeric unit code, unknown codes fall back to meters
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Feet,
            2 => Self::Fathoms,
            3 => Self::Cubits,
            4 => Self::Willetts,
            _ => Self::Meters,
        }
    }

    /// Numeric unit code
    pub const fn code(self) -> u8 {
        match self {
            Self::Meters => 0,
            Self::Feet => 1,
            Self::Fathoms => 2,
            Self::Cubits => 3,
            Self::Willetts => 4,
        }
    }

    /// Header keyword for these units
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meters => "METERS",
            Self::Feet => "FEET",
            Self::Fathoms => "FATHOMS",
            Self::Cubits => "CUBITS",
            Self::Willetts => "WILLETTS",
        }
    }

    /// Parse a `[DEPTH UNITS]` value, accepting keywords or numeric codes
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_ascii_uppercase();
        match value.as_str() {
            "FEET" => Self::Feet,
            "FATHOMS" => Self::Fathoms,
            "CUBITS" => Self::Cubits,
            "WILLETTS" => Self::Willetts,
            other => other.parse::<u8>().map_or(Self::Meters, Self::from_code),
        }
    }
}

impl fmt::Display for DepthUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legacy flag bytes count as set only when exactly 1
pub const fn flag_from_code(code: u8) -> bool {
    code == 1
}

/// In-memory LLZ header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMetadata {
    /// Full `[VERSION]` string
    pub version: String,
    /// Records carry seconds/nanoseconds
    pub time_flag: bool,
    /// Records carry an uncertainty value
    pub uncertainty_flag: bool,
    /// Units of depth values
    pub depth_units: DepthUnits,
    /// Byte order of the records
    pub byte_order: ByteOrder,
    /// `[CLASSIFICATION]`
    pub classification: String,
    /// `[DISTRIBUTION]`
    pub distribution: String,
    /// `[DECLASSIFICATION]`
    pub declassification: String,
    /// `[CLASSIFICATION JUSTIFICATION]`
    pub classification_justification: String,
    /// `[DOWNGRADE]`
    pub downgrade: String,
    /// `[SOURCE]`
    pub source: String,
    /// `[COMMENTS]`
    pub comments: String,
    /// `[CREATION DATE]`
    pub creation_date: String,
    /// `[LAST MODIFIED DATE]`
    pub modified_date: String,
    /// `[NUMBER OF RECORDS]`
    pub number_of_records: u32,
    /// Unrecognized keys, kept in file order
    pub extra: Vec<(String, String)>,
}

impl Default for HeaderMetadata {
    fn default() -> Self {
        Self {
            version: LIBRARY_VERSION.to_string(),
            time_flag: false,
            uncertainty_flag: false,
            depth_units: DepthUnits::Meters,
            byte_order: ByteOrder::native(),
            classification: String::new(),
            distribution: String::new(),
            declassification: String::new(),
            classification_justification: String::new(),
            downgrade: String::new(),
            source: String::new(),
            comments: String::new(),
            creation_date: String::new(),
            modified_date: String::new(),
            number_of_records: 0,
            extra: Vec::new(),
        }
    }
}

impl HeaderMetadata {
    /// Create a header for a new file
    ///
    /// Flag and unit values come as the legacy numeric codes and are
    /// normalized: flags other than 1 are cleared, unit codes above 4 become
    /// meters.
    pub fn from_codes(time_flag: u8, uncertainty_flag: u8, depth_units: u8) -> Self {
        Self {
            time_flag: flag_from_code(time_flag),
            uncertainty_flag: flag_from_code(uncertainty_flag),
            depth_units: DepthUnits::from_code(depth_units),
            ..Self::default()
        }
    }

    /// Whether a leading probe block carries the LLZ signature
    pub fn has_signature(probe: &[u8]) -> bool {
        probe
            .windows(SIGNATURE.len())
            .any(|window| window == SIGNATURE.as_bytes())
    }

    /// Parsed format version
    pub fn format_version(&self) -> Result<FormatVersion> {
        FormatVersion::parse(&self.version)
    }

    /// Record layout implied by the version and flags
    pub fn layout(&self) -> Result<RecordLayout> {
        Ok(RecordLayout::resolve(
            self.format_version()?,
            self.time_flag,
            self.uncertainty_flag,
        ))
    }

    /// Parse the header block
    ///
    /// `data` may be the full block or any prefix that still contains the
    /// end-of-header line. Parsing stops at the first zero byte.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text_len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        let text = String::from_utf8_lossy(&data[..text_len]);

        let mut header = Self {
            version: String::new(),
            ..Self::default()
        };
        let mut terminated = false;

        for line in text.lines() {
            if line.contains(END_OF_HEADER) {
                terminated = true;
                break;
            }

            let Some((key, value)) = parse_line(line) else {
                continue;
            };

            match key {
                "VERSION" => header.version = value.to_string(),
                "TIME FLAG" => header.time_flag = parse_int_flag(value),
                "UNCERTAINTY FLAG" => header.uncertainty_flag = parse_int_flag(value),
                "DEPTH UNITS" => header.depth_units = DepthUnits::parse(value),
                "ENDIAN" => {
                    if let Ok(order) = value.parse() {
                        header.byte_order = order;
                    }
                }
                "CLASSIFICATION" => header.classification = value.to_string(),
                "DISTRIBUTION" => header.distribution = value.to_string(),
                "DECLASSIFICATION" => header.declassification = value.to_string(),
                "CLASSIFICATION JUSTIFICATION" => {
                    header.classification_justification = value.to_string();
                }
                "DOWNGRADE" => header.downgrade = value.to_string(),
                "SOURCE" => header.source = value.to_string(),
                "COMMENTS" => header.comments = value.to_string(),
                "CREATION DATE" | "CREATION_DATE" => header.creation_date = value.to_string(),
                "LAST MODIFIED DATE" => header.modified_date = value.to_string(),
                "NUMBER OF RECORDS" => {
                    header.number_of_records =
                        value
                            .parse()
                            .map_err(|_| FormatError::InvalidHeaderValue {
                                key: key.to_string(),
                                value: value.to_string(),
                            })?;
                }
                _ => header.extra.push((key.to_string(), value.to_string())),
            }
        }

        if !terminated {
            return Err(FormatError::MissingEndOfHeader);
        }

        Ok(header)
    }

    /// Build the zero padded header block of exactly [`HEADER_SIZE`] bytes
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut text = String::new();

        push_line(&mut text, "VERSION", &self.version);
        push_line(&mut text, "TIME FLAG", if self.time_flag { "1" } else { "0" });
        push_line(
            &mut text,
            "UNCERTAINTY FLAG",
            if self.uncertainty_flag { "1" } else { "0" },
        );
        push_line(&mut text, "DEPTH UNITS", self.depth_units.as_str());
        push_line(&mut text, "ENDIAN", self.byte_order.as_str());
        push_line(&mut text, "CLASSIFICATION", &self.classification);
        push_line(&mut text, "DISTRIBUTION", &self.distribution);
        push_line(&mut text, "DECLASSIFICATION", &self.declassification);
        push_line(
            &mut text,
            "CLASSIFICATION JUSTIFICATION",
            &self.classification_justification,
        );
        push_line(&mut text, "DOWNGRADE", &self.downgrade);
        push_line(&mut text, "SOURCE", &self.source);
        push_line(&mut text, "COMMENTS", &self.comments);
        push_line(&mut text, "CREATION DATE", &self.creation_date);
        push_line(&mut text, "LAST MODIFIED DATE", &self.modified_date);
        push_line(
            &mut text,
            "NUMBER OF RECORDS",
            &self.number_of_records.to_string(),
        );
        for (key, value) in &self.extra {
            push_line(&mut text, key, value);
        }
        let _ = writeln!(text, "{END_OF_HEADER}");

        if text.len() > HEADER_SIZE {
            return Err(FormatError::HeaderTooLarge {
                size: text.len(),
                limit: HEADER_SIZE,
            });
        }

        let mut block = text.into_bytes();
        block.resize(HEADER_SIZE, 0);
        Ok(block)
    }
}

/// Split a `[KEY] = value` line into its trimmed key and value
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (key, rest) = rest.split_once(']')?;
    let (_, value) = rest.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// Leading integer of a flag value, nonzero means set
fn parse_int_flag(value: &str) -> bool {
    let digits: String = value
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(_, c)| c)
        .collect();
    digits.parse::<i64>().is_ok_and(|v| v != 0)
}

fn push_line(text: &mut String, key: &str, value: &str) {
    // A value spanning lines would end the entry early on the next parse
    let value = value.replace(['\r', '\n'], " ");
    let _ = writeln!(text, "[{key}] = {value}");
}
