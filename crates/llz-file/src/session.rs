//! A single open LLZ file
//!
//! A [`Session`] owns the file, its parsed header and resolved record layout,
//! and the state needed to interleave reads, appends and in-place updates:
//!
//! - the sequential cursor used by [`RecordIndex::Next`]
//! - the [`HeaderState`] deciding what close must rewrite
//! - where the file position is and which direction the last I/O went, so
//!   buffered writes are flushed before switching to reads
//!
//! Every record write is flushed before the call returns. A failed write
//! leaves the record count and header state untouched.

use crate::config::FileTableConfig;
use crate::{LlzError, Result};
use chrono::Local;
use llz_format::{
    FormatVersion, HEADER_SIZE, HeaderMetadata, LIBRARY_VERSION, PROBE_SIZE, RawRecord, Record,
    RecordLayout,
};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Layout of C `asctime`, used for header date stamps
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Which record to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordIndex {
    /// The record at the sequential cursor
    Next,
    /// A specific record
    At(u32),
}

impl From<u32> for RecordIndex {
    fn from(recnum: u32) -> Self {
        Self::At(recnum)
    }
}

/// What the header needs at close
///
/// States are ordered; transitions only ever move upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderState {
    /// Header on disk matches memory
    Clean,
    /// Records were overwritten, modified date needs stamping
    Modified,
    /// Records were appended, record count changed
    Resized,
    /// New file, creation date still to be stamped
    Created,
}

impl HeaderState {
    /// Transition after an append
    pub fn appended(self) -> Self {
        self.max(Self::Resized)
    }

    /// Transition after an in-place update
    pub fn updated(self) -> Self {
        self.max(Self::Modified)
    }

    /// Whether close must rewrite the header
    pub fn is_dirty(self) -> bool {
        self != Self::Clean
    }

    /// Whether close must stamp the creation date
    pub fn needs_creation_date(self) -> bool {
        self == Self::Created
    }
}

/// Where the file position is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Just past the last record, ready to append
    AtEnd,
    /// Somewhere else
    Positioned,
}

/// Direction of the last record I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Read,
    Write,
}

/// An open LLZ file
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    file: BufWriter<File>,
    header: HeaderMetadata,
    version: FormatVersion,
    layout: RecordLayout,
    cursor: u32,
    state: HeaderState,
    position: Position,
    direction: Direction,
}

impl Session {
    /// Create a new file and write its header
    ///
    /// The header is written with this library's version and zero records.
    /// Dates are stamped at close. A header that would not fit once stamped
    /// is rejected before the file is touched.
    pub fn create(path: impl AsRef<Path>, header: &HeaderMetadata) -> Result<Self> {
        let path = path.as_ref();
        let mut header = header.clone();
        header.version = LIBRARY_VERSION.to_string();
        header.number_of_records = 0;

        let version = header.format_version()?;
        let layout = header.layout()?;
        reserve_header_room(&header, true)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut file = BufWriter::new(file);
        file.write_all(&header.build()?)?;
        file.flush()?;

        info!(
            "Created LLZ file {} ({}, {} byte records, {} order)",
            path.display(),
            version,
            layout.stride(),
            header.byte_order
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            version,
            layout,
            cursor: 0,
            state: HeaderState::Created,
            position: Position::AtEnd,
            direction: Direction::Write,
        })
    }

    /// Open an existing file and parse its header
    ///
    /// The first [`PROBE_SIZE`] bytes must carry the LLZ signature, otherwise
    /// the file is rejected with [`LlzError::NotThisFormat`] before any header
    /// parsing.
    pub fn open(path: impl AsRef<Path>, config: &FileTableConfig) -> Result<Self> {
        let path = path.as_ref();

        let mut file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(e) if config.read_only_fallback => {
                debug!(
                    "Opening {} read-only after read/write open failed: {}",
                    path.display(),
                    e
                );
                File::open(path)?
            }
            Err(e) => return Err(e.into()),
        };

        let mut probe = [0u8; PROBE_SIZE];
        if file.read_exact(&mut probe).is_err() || !HeaderMetadata::has_signature(&probe) {
            return Err(LlzError::NotThisFormat {
                path: path.to_path_buf(),
            });
        }

        file.seek(SeekFrom::Start(0))?;
        let mut block = Vec::with_capacity(HEADER_SIZE);
        (&mut file).take(HEADER_SIZE as u64).read_to_end(&mut block)?;

        let header = HeaderMetadata::parse(&block)?;
        let version = header.format_version()?;
        let layout = header.layout()?;

        debug!(
            "Opened LLZ file {} ({}, era {}, {} records of {} bytes, swap={})",
            path.display(),
            version,
            version.era(),
            header.number_of_records,
            layout.stride(),
            header.byte_order.needs_swap()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            header,
            version,
            layout,
            cursor: 0,
            state: HeaderState::Clean,
            position: Position::Positioned,
            direction: Direction::Read,
        })
    }

    /// Path the session was opened with
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory header, including the current record count
    pub const fn header(&self) -> &HeaderMetadata {
        &self.header
    }

    /// Parsed file version
    pub const fn version(&self) -> FormatVersion {
        self.version
    }

    /// Resolved record layout
    pub const fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Number of records in the file
    pub const fn record_count(&self) -> u32 {
        self.header.number_of_records
    }

    /// Record returned by the next sequential read
    pub const fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Pending header work for close
    pub const fn state(&self) -> HeaderState {
        self.state
    }

    /// Read a record
    ///
    /// Returns `Ok(None)` when [`RecordIndex::Next`] has passed the last
    /// record. Every successful read advances the sequential cursor by one,
    /// including reads of a specific record.
    pub fn read(&mut self, index: RecordIndex) -> Result<Option<Record>> {
        let count = self.record_count();
        let recnum = match index {
            RecordIndex::Next if self.cursor >= count => return Ok(None),
            RecordIndex::Next => self.cursor,
            RecordIndex::At(recnum) if recnum >= count => {
                return Err(LlzError::RecordOutOfRange { recnum, count });
            }
            RecordIndex::At(recnum) => recnum,
        };

        if self.direction == Direction::Write {
            self.file.flush()?;
        }
        self.direction = Direction::Read;
        self.position = Position::Positioned;

        let offset = self.layout.offset(recnum);
        self.file.seek(SeekFrom::Start(offset))?;

        // The seek emptied the write buffer, so reading the inner file is safe
        let mut buffer = vec![0u8; self.layout.stride()];
        self.file.get_mut().read_exact(&mut buffer)?;

        let raw = RawRecord::from_bytes(&buffer, &self.layout, self.header.byte_order)?;
        trace!("Read record {} at offset {}: {:?}", recnum, offset, raw);

        self.cursor = self.cursor.saturating_add(1);
        Ok(Some(raw.decode(&self.layout)))
    }

    /// Append a record after the last one
    ///
    /// The record count in the header is only persisted at close.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let count = self
            .record_count()
            .checked_add(1)
            .ok_or_else(|| LlzError::InvalidArgument("record count overflow".to_string()))?;
        let bytes = self.encode(record)?;
        if !self.state.is_dirty() {
            reserve_header_room(&self.header, false)?;
        }

        if self.direction == Direction::Read {
            self.file.flush()?;
        }
        self.direction = Direction::Write;

        let target = (self.position != Position::AtEnd).then_some(SeekFrom::End(0));
        self.write_record(target, &bytes)?;
        self.position = Position::AtEnd;

        trace!("Appended record {} to {}", count - 1, self.path.display());

        self.header.number_of_records = count;
        self.state = self.state.appended();
        Ok(())
    }

    /// Overwrite record `recnum` in place
    ///
    /// Only the bytes of that record change. The record count and the
    /// sequential cursor are left alone.
    pub fn update(&mut self, recnum: u32, record: &Record) -> Result<()> {
        let count = self.record_count();
        if recnum >= count {
            return Err(LlzError::RecordOutOfRange { recnum, count });
        }
        let bytes = self.encode(record)?;
        if !self.state.is_dirty() {
            reserve_header_room(&self.header, false)?;
        }

        if self.direction == Direction::Read {
            self.file.flush()?;
        }
        self.direction = Direction::Write;
        self.position = Position::Positioned;

        let offset = self.layout.offset(recnum);
        self.write_record(Some(SeekFrom::Start(offset)), &bytes)?;

        trace!("Updated record {} at offset {}", recnum, offset);

        self.state = self.state.updated();
        Ok(())
    }

    /// Current byte position in the file
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    /// Stamp dates, rewrite the header if needed and release the file
    pub fn close(mut self) -> Result<()> {
        if self.state.is_dirty() {
            let now = timestamp();
            if self.state.needs_creation_date() {
                self.header.creation_date.clone_from(&now);
            }
            self.header.modified_date = now;

            let block = self.header.build()?;
            self.file.seek(SeekFrom::Start(0))?;
            self.file.write_all(&block)?;

            debug!(
                "Rewrote header of {} ({:?}, {} records)",
                self.path.display(),
                self.state,
                self.header.number_of_records
            );
        }

        self.file.flush()?;
        debug!("Closed LLZ file {}", self.path.display());
        Ok(())
    }

    fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        Ok(RawRecord::encode(record, &self.layout).to_bytes(&self.layout, self.header.byte_order)?)
    }

    /// Write one encoded record and flush it, seeking to `target` first
    fn write_record(&mut self, target: Option<SeekFrom>, bytes: &[u8]) -> Result<()> {
        if let Err(e) = push_record(&mut self.file, target, bytes) {
            self.position = Position::Positioned;
            if let Err(discard) = self.discard_pending() {
                warn!(
                    "Failed to drop unwritten bytes for {}: {}",
                    self.path.display(),
                    discard
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Drop bytes a failed write left in the buffer
    fn discard_pending(&mut self) -> Result<()> {
        let replacement = BufWriter::new(self.file.get_ref().try_clone()?);
        let (_, unwritten) = std::mem::replace(&mut self.file, replacement).into_parts();
        debug!(
            "Dropped {} unwritten bytes for {}",
            unwritten.map_or(0, |buffer| buffer.len()),
            self.path.display()
        );
        Ok(())
    }
}

fn push_record(
    file: &mut BufWriter<File>,
    target: Option<SeekFrom>,
    bytes: &[u8],
) -> io::Result<()> {
    if let Some(target) = target {
        file.seek(target)?;
    }
    file.write_all(bytes)?;
    file.flush()
}

fn timestamp() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Check that the header still fits once close stamps its dates
///
/// The record count is taken at its widest so later appends cannot push the
/// header over [`HEADER_SIZE`].
fn reserve_header_room(header: &HeaderMetadata, stamp_creation: bool) -> Result<()> {
    let now = timestamp();
    let mut widest = header.clone();
    if stamp_creation {
        widest.creation_date.clone_from(&now);
    }
    widest.modified_date = now;
    widest.number_of_records = u32::MAX;
    widest.build()?;
    Ok(())
}
