//! File sessions for LLZ point-record files.
//!
//! This crate opens, creates and edits LLZ files on disk using the codecs from
//! `llz-format`. An [`LlzFiles`] table owns every open file; callers work
//! through [`Handle`]s:
//!
//! - **create**: write a new header immediately, records follow by append
//! - **open**: probe the signature, parse the header, resolve the layout
//! - **read**: random access by record number or sequential with
//!   [`RecordIndex::Next`]
//! - **append** / **update**: add records at the end or overwrite in place
//! - **close**: stamp dates and rewrite the header when anything changed
//!
//! # Example
//!
//! ```rust,no_run
//! use llz_file::{LlzFiles, RecordIndex};
//! use llz_format::{HeaderMetadata, Record, Timestamp};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut files = LlzFiles::default();
//!
//! let header = HeaderMetadata {
//!     time_flag: true,
//!     source: "Multibeam survey".to_string(),
//!     ..HeaderMetadata::default()
//! };
//! let handle = files.create("survey.llz", &header)?;
//! let point = Record::new(30.25, -88.5, 12.75).with_time(Timestamp::new(1_700_000_000, 0));
//! files.append(handle, &point)?;
//! files.close(handle)?;
//!
//! let (handle, header) = files.open("survey.llz")?;
//! println!("{} records", header.number_of_records);
//! while let Some(record) = files.read(handle, RecordIndex::Next)? {
//!     println!("{:.7} {:.7} {:.4}", record.latitude, record.longitude, record.depth);
//! }
//! files.close(handle)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Configuration
pub mod config;

mod error;

// Single open file
pub mod session;

// Handle table
pub mod table;

pub use config::FileTableConfig;
pub use error::{LlzError, Result};
pub use session::{HeaderState, RecordIndex, Session};
pub use table::{Handle, LlzFiles};
