//! Handle table owning every open LLZ session
//!
//! Sessions live in a fixed number of slots. A [`Handle`] names a slot plus
//! the generation it was issued for; closing a session bumps the slot's
//! generation, so a handle kept past `close` is rejected instead of reaching
//! whatever session reuses the slot.

use crate::config::FileTableConfig;
use crate::session::{RecordIndex, Session};
use crate::{LlzError, Result};
use llz_format::{FormatVersion, HeaderMetadata, Record};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Opaque reference to an open LLZ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u32,
}

impl Handle {
    /// Slot index inside the table
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "llz#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    session: Option<Session>,
}

/// Table of open LLZ files
///
/// All operations take `&mut self`; share a table across threads only behind
/// a lock.
#[derive(Debug)]
pub struct LlzFiles {
    slots: Vec<Slot>,
    config: FileTableConfig,
}

impl Default for LlzFiles {
    fn default() -> Self {
        Self::new(FileTableConfig::default())
    }
}

impl LlzFiles {
    /// Create an empty table
    pub fn new(config: FileTableConfig) -> Self {
        let slots = (0..config.capacity).map(|_| Slot::default()).collect();
        Self { slots, config }
    }

    /// Table configuration
    pub const fn config(&self) -> &FileTableConfig {
        &self.config
    }

    /// Maximum number of simultaneously open files
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently open files
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.session.is_some()).count()
    }

    /// Create a new LLZ file
    ///
    /// The header's version and record count are replaced with this library's
    /// version and zero. Time and uncertainty flags, depth units and byte
    /// order are taken as given.
    pub fn create(&mut self, path: impl AsRef<Path>, header: &HeaderMetadata) -> Result<Handle> {
        let index = self.free_slot()?;
        let session = Session::create(path, header)?;
        Ok(self.install(index, session))
    }

    /// Open an existing LLZ file
    ///
    /// Returns the handle and a copy of the parsed header. Nothing is
    /// allocated when the file is rejected.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(Handle, HeaderMetadata)> {
        let index = self.free_slot()?;
        let session = Session::open(path, &self.config)?;
        let header = session.header().clone();
        Ok((self.install(index, session), header))
    }

    /// Close a file, rewriting its header if it changed
    ///
    /// The slot is released even when the final header write fails.
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        self.session(handle)?;
        let slot = &mut self.slots[handle.index];
        slot.generation = slot.generation.wrapping_add(1);
        match slot.session.take() {
            Some(session) => session.close(),
            None => Err(LlzError::StaleHandle {
                index: handle.index,
            }),
        }
    }

    /// Read a record, `Ok(None)` once sequential reading reaches the end
    pub fn read(&mut self, handle: Handle, index: RecordIndex) -> Result<Option<Record>> {
        self.session_mut(handle)?.read(index)
    }

    /// Append a record
    pub fn append(&mut self, handle: Handle, record: &Record) -> Result<()> {
        self.session_mut(handle)?.append(record)
    }

    /// Overwrite record `recnum`
    pub fn update(&mut self, handle: Handle, recnum: u32, record: &Record) -> Result<()> {
        self.session_mut(handle)?.update(recnum, record)
    }

    /// Current byte position in the file
    pub fn tell(&mut self, handle: Handle) -> Result<u64> {
        self.session_mut(handle)?.tell()
    }

    /// In-memory header of an open file
    pub fn header(&self, handle: Handle) -> Result<&HeaderMetadata> {
        Ok(self.session(handle)?.header())
    }

    /// Parsed version of an open file
    pub fn format_version(&self, handle: Handle) -> Result<FormatVersion> {
        Ok(self.session(handle)?.version())
    }

    /// Current record count of an open file
    pub fn record_count(&self, handle: Handle) -> Result<u32> {
        Ok(self.session(handle)?.record_count())
    }

    /// Borrow the session behind a handle
    pub fn session(&self, handle: Handle) -> Result<&Session> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.session.as_ref())
            .ok_or(LlzError::StaleHandle {
                index: handle.index,
            })
    }

    /// Mutably borrow the session behind a handle
    pub fn session_mut(&mut self, handle: Handle) -> Result<&mut Session> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.session.as_mut())
            .ok_or(LlzError::StaleHandle {
                index: handle.index,
            })
    }

    fn free_slot(&self) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| slot.session.is_none())
            .ok_or(LlzError::ResourceExhausted {
                capacity: self.slots.len(),
            })
    }

    fn install(&mut self, index: usize, session: Session) -> Handle {
        let slot = &mut self.slots[index];
        debug!("Assigned {} to slot {}", session.path().display(), index);
        slot.session = Some(session);
        Handle {
            index,
            generation: slot.generation,
        }
    }
}

impl Drop for LlzFiles {
    fn drop(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(session) = slot.session.take() {
                let path = session.path().to_path_buf();
                if let Err(e) = session.close() {
                    warn!(
                        "Failed to close {} (slot {}) on drop: {}",
                        path.display(),
                        index,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slots_are_reused_with_new_generation() {
        let dir = TempDir::new().unwrap();
        let mut files = LlzFiles::new(FileTableConfig::new(1));

        let first = files
            .create(dir.path().join("a.llz"), &HeaderMetadata::default())
            .unwrap();
        files.close(first).unwrap();

        let second = files
            .create(dir.path().join("b.llz"), &HeaderMetadata::default())
            .unwrap();
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);

        assert!(matches!(
            files.append(first, &Record::new(1.0, 2.0, 3.0)),
            Err(LlzError::StaleHandle { index: 0 })
        ));
        assert!(matches!(
            files.close(first),
            Err(LlzError::StaleHandle { .. })
        ));
        assert_eq!(files.record_count(second).unwrap(), 0);
        files.close(second).unwrap();
    }

    #[test]
    fn test_capacity_is_enforced() {
        let dir = TempDir::new().unwrap();
        let mut files = LlzFiles::new(FileTableConfig::new(2));
        let header = HeaderMetadata::default();

        let a = files.create(dir.path().join("a.llz"), &header).unwrap();
        let _b = files.create(dir.path().join("b.llz"), &header).unwrap();
        assert_eq!(files.open_count(), 2);

        let err = files.create(dir.path().join("c.llz"), &header).unwrap_err();
        assert!(matches!(err, LlzError::ResourceExhausted { capacity: 2 }));
        assert!(!dir.path().join("c.llz").exists());

        let err = files.open(dir.path().join("a.llz")).unwrap_err();
        assert!(matches!(err, LlzError::ResourceExhausted { .. }));

        files.close(a).unwrap();
        assert_eq!(files.open_count(), 1);
        files.create(dir.path().join("c.llz"), &header).unwrap();
        assert_eq!(files.open_count(), 2);
    }

    #[test]
    fn test_first_free_slot_is_used() {
        let dir = TempDir::new().unwrap();
        let mut files = LlzFiles::default();
        let header = HeaderMetadata::default();

        let a = files.create(dir.path().join("a.llz"), &header).unwrap();
        let b = files.create(dir.path().join("b.llz"), &header).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));

        files.close(a).unwrap();
        let c = files.create(dir.path().join("c.llz"), &header).unwrap();
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_drop_closes_open_sessions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped.llz");
        {
            let mut files = LlzFiles::default();
            let handle = files.create(&path, &HeaderMetadata::default()).unwrap();
            files.append(handle, &Record::new(1.0, 2.0, 3.0)).unwrap();
        }

        let mut files = LlzFiles::default();
        let (_, header) = files.open(&path).unwrap();
        assert_eq!(header.number_of_records, 1);
    }

    #[test]
    fn test_unknown_handle_index() {
        let mut files = LlzFiles::new(FileTableConfig::new(1));
        let bogus = Handle {
            index: 5,
            generation: 0,
        };
        assert!(matches!(
            files.tell(bogus),
            Err(LlzError::StaleHandle { index: 5 })
        ));
    }

    #[test]
    fn test_handle_display() {
        let handle = Handle {
            index: 3,
            generation: 2,
        };
        assert_eq!(handle.to_string(), "llz#3.2");
    }
}
