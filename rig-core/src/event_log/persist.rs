//! Non-volatile image of the event log.
//!
//! Layout, relative to the store's base offset:
//!
//! ```text
//! [0..2)              sequence number, little endian
//! [2]                 entry count
//! [3 .. 3 + 4*CAP)    entries: opcode, param, timestamp lo, timestamp hi
//! [3 + 4*CAP]         complement: CAP - count
//! ```
//!
//! The image is accepted only when `count + complement == CAP` and
//! `0 < count < CAP`. A commit parks the complement at `CAP + 1` before
//! touching anything else, so a write interrupted part way leaves an image
//! that fails the check instead of one that loads truncated.

use core::fmt;

use embedded_storage::{ReadStorage, Storage};

use super::{EventLog, LogEntry};

const SEQUENCE_OFFSET: u32 = 0;
const COUNT_OFFSET: u32 = 2;
const ENTRIES_OFFSET: u32 = 3;

/// Entries moved per storage call. Keeps the stack buffer small while
/// avoiding one storage transaction per entry.
const CHUNK_ENTRIES: usize = 16;

/// Failure talking to the backing store.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PersistError<E> {
    Storage(E),
    /// The store ends before the image does.
    RegionTooSmall,
}

impl<E: fmt::Debug> fmt::Display for PersistError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Storage(err) => write!(f, "storage error: {err:?}"),
            PersistError::RegionTooSmall => f.write_str("storage region too small for log image"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for PersistError<E> {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            PersistError::Storage(_) => defmt::write!(f, "storage error"),
            PersistError::RegionTooSmall => defmt::write!(f, "storage region too small"),
        }
    }
}

/// What [`EventLog::init`] found in storage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestoreOutcome {
    /// A valid image was loaded.
    Restored { entries: usize },
    /// The image is consistent but holds no entries.
    Empty,
    /// The check bytes do not match; the log starts empty.
    Invalid,
    /// The store could not be read; the log starts empty.
    Unreadable,
}

/// Location of the log image within a byte-addressed store.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogStore {
    base: u32,
}

impl LogStore {
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Bytes occupied by an image of `capacity` entries.
    #[must_use]
    pub const fn image_len(capacity: usize) -> usize {
        ENTRIES_OFFSET as usize + capacity * LogEntry::ENCODED_LEN + 1
    }

    /// Absolute offset of the complement byte for `capacity` entries.
    #[must_use]
    pub fn complement_offset(&self, capacity: usize) -> u32 {
        let entries = u32::try_from(capacity * LogEntry::ENCODED_LEN).unwrap_or(u32::MAX);
        self.base
            .saturating_add(ENTRIES_OFFSET)
            .saturating_add(entries)
    }

    /// Reads the stored sequence number.
    ///
    /// # Errors
    /// Fails when the store cannot be read or is too small.
    pub fn read_sequence<S: ReadStorage>(
        &self,
        storage: &mut S,
        capacity: usize,
    ) -> Result<u16, PersistError<S::Error>> {
        self.check_fits(storage, capacity)?;
        let mut bytes = [0u8; 2];
        storage
            .read(self.base + SEQUENCE_OFFSET, &mut bytes)
            .map_err(PersistError::Storage)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads the count and complement bytes.
    ///
    /// # Errors
    /// Fails when the store cannot be read or is too small.
    pub fn read_check_bytes<S: ReadStorage>(
        &self,
        storage: &mut S,
        capacity: usize,
    ) -> Result<(u8, u8), PersistError<S::Error>> {
        self.check_fits(storage, capacity)?;
        let mut count = [0u8];
        let mut complement = [0u8];
        storage
            .read(self.base + COUNT_OFFSET, &mut count)
            .map_err(PersistError::Storage)?;
        storage
            .read(self.complement_offset(capacity), &mut complement)
            .map_err(PersistError::Storage)?;
        Ok((count[0], complement[0]))
    }

    fn check_fits<S: ReadStorage>(
        &self,
        storage: &S,
        capacity: usize,
    ) -> Result<(), PersistError<S::Error>> {
        let end = usize::try_from(self.base)
            .unwrap_or(usize::MAX)
            .saturating_add(Self::image_len(capacity));
        if storage.capacity() < end {
            return Err(PersistError::RegionTooSmall);
        }
        Ok(())
    }

    fn read_entries<S: ReadStorage>(
        &self,
        storage: &mut S,
        entries: &mut [LogEntry],
    ) -> Result<(), PersistError<S::Error>> {
        let mut buf = [0u8; CHUNK_ENTRIES * LogEntry::ENCODED_LEN];
        let mut offset = self.base + ENTRIES_OFFSET;
        for chunk in entries.chunks_mut(CHUNK_ENTRIES) {
            let bytes = &mut buf[..chunk.len() * LogEntry::ENCODED_LEN];
            storage.read(offset, bytes).map_err(PersistError::Storage)?;
            for (entry, raw) in chunk.iter_mut().zip(bytes.chunks_exact(LogEntry::ENCODED_LEN)) {
                *entry = LogEntry::from_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
            offset += chunk_len(bytes)?;
        }
        Ok(())
    }

    fn write_entries<S: Storage>(
        &self,
        storage: &mut S,
        entries: &[LogEntry],
    ) -> Result<(), PersistError<S::Error>> {
        let mut buf = [0u8; CHUNK_ENTRIES * LogEntry::ENCODED_LEN];
        let mut offset = self.base + ENTRIES_OFFSET;
        for chunk in entries.chunks(CHUNK_ENTRIES) {
            let bytes = &mut buf[..chunk.len() * LogEntry::ENCODED_LEN];
            for (entry, raw) in chunk.iter().zip(bytes.chunks_exact_mut(LogEntry::ENCODED_LEN)) {
                raw.copy_from_slice(&entry.to_bytes());
            }
            storage.write(offset, bytes).map_err(PersistError::Storage)?;
            offset += chunk_len(bytes)?;
        }
        Ok(())
    }

    fn write_byte<S: Storage>(
        storage: &mut S,
        offset: u32,
        value: u8,
    ) -> Result<(), PersistError<S::Error>> {
        storage.write(offset, &[value]).map_err(PersistError::Storage)
    }
}

fn chunk_len<E>(bytes: &[u8]) -> Result<u32, PersistError<E>> {
    u32::try_from(bytes.len()).map_err(|_| PersistError::RegionTooSmall)
}

/// Count and complement values; the log capacity is always below 255.
fn check_byte(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

impl<const CAP: usize> EventLog<CAP> {
    /// Loads the persisted image, falling back to an empty log.
    ///
    /// Always disables logging and arms the one-shot sequence bump for the
    /// next [`Self::reset`].
    pub fn init<S: ReadStorage>(&mut self, store: &LogStore, storage: &mut S) -> RestoreOutcome {
        self.enabled = false;
        self.count = 0;
        self.sequence_bump_armed = true;

        self.load(store, storage)
            .unwrap_or(RestoreOutcome::Unreadable)
    }

    fn load<S: ReadStorage>(
        &mut self,
        store: &LogStore,
        storage: &mut S,
    ) -> Result<RestoreOutcome, PersistError<S::Error>> {
        self.sequence = store.read_sequence(storage, CAP)?;

        let (count, complement) = store.read_check_bytes(storage, CAP)?;
        let (count, complement) = (usize::from(count), usize::from(complement));
        if count + complement != CAP {
            return Ok(RestoreOutcome::Invalid);
        }
        if count == 0 {
            return Ok(RestoreOutcome::Empty);
        }
        if count >= CAP {
            return Ok(RestoreOutcome::Invalid);
        }

        store.read_entries(storage, &mut self.entries[..count])?;
        self.count = count;
        Ok(RestoreOutcome::Restored { entries: count })
    }

    /// Writes the in-memory log to storage.
    ///
    /// An empty log leaves the stored image untouched.
    ///
    /// # Errors
    /// Returns the first storage failure; the stored image is then left
    /// invalid rather than partially valid.
    pub fn commit<S: Storage>(
        &mut self,
        store: &LogStore,
        storage: &mut S,
    ) -> Result<(), PersistError<S::Error>> {
        if self.count == 0 {
            return Ok(());
        }
        store.check_fits(storage, CAP)?;

        let complement = store.complement_offset(CAP);
        LogStore::write_byte(storage, complement, check_byte(CAP + 1))?;
        LogStore::write_byte(storage, store.base + COUNT_OFFSET, check_byte(self.count))?;
        store.write_entries(storage, self.entries())?;
        storage
            .write(store.base + SEQUENCE_OFFSET, &self.sequence.to_le_bytes())
            .map_err(PersistError::Storage)?;
        LogStore::write_byte(storage, complement, check_byte(CAP - self.count))?;

        self.sequence_bump_armed = true;
        Ok(())
    }
}
