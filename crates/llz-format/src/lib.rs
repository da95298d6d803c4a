//! Header, version and record codecs for LLZ point-record files
//!
#![allow(clippy::cast_possible_truncation)] // Status fields narrow to their stored width
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // Header keys don't need backticks
#![allow(clippy::float_cmp)] // Fixed-point round trips compare exactly
//! An LLZ file is a 16384 byte ASCII header followed by fixed size binary
//! records of `[time]/[uncertainty]/lat/lon/depth/status`. Four historical
//! record layouts exist and are all readable:
//!
//! - **V1**: lat/lon/depth and a 32-bit status
//! - **V2**: optional time, 32-bit status
//! - **V3**: optional time and uncertainty, 32-bit status
//! - **V4+**: optional time and uncertainty, 16-bit status
//!
//! This crate is I/O agnostic. It parses and builds the header block,
//! resolves the record layout from the version and flags, computes record
//! offsets and converts records between physical units and their scaled
//! on-disk form. The `llz-file` crate builds file sessions on top of it.
//!
//! # Example
//!
//! ```rust
//! use llz_format::{ByteOrder, HeaderMetadata, RawRecord, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let header = HeaderMetadata::default();
//! let layout = header.layout()?;
//!
//! let record = Record::new(30.25, -88.5, 12.75);
//! let bytes = RawRecord::encode(&record, &layout).to_bytes(&layout, ByteOrder::Big)?;
//! assert_eq!(bytes.len(), layout.stride());
//!
//! let back = RawRecord::from_bytes(&bytes, &layout, ByteOrder::Big)?.decode(&layout);
//! assert_eq!(back, record);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Byte order of record data
pub mod endian;
pub mod error;
pub mod header;
pub mod layout;
pub mod record;
pub mod version;

pub use endian::ByteOrder;
pub use error::{FormatError, Result};
pub use header::{DepthUnits, HEADER_SIZE, HeaderMetadata, PROBE_SIZE};
pub use layout::{RecordLayout, StatusWidth, record_offset};
pub use record::{RawRecord, Record, Timestamp, status};
pub use version::{FormatEra, FormatVersion, LIBRARY_VERSION, SIGNATURE};
