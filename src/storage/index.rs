use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::types::{INDEX_ENTRY_SIZE, RowOffset, error::DatabaseError};

/// One `(key, offset)` record of an equality index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: u64,
    pub offset: RowOffset,
}

impl IndexEntry {
    pub fn new(key: u64, offset: RowOffset) -> Self {
        Self { key, offset }
    }

    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buffer = [0u8; INDEX_ENTRY_SIZE];
        buffer[..8].copy_from_slice(&self.key.to_le_bytes());
        buffer[8..].copy_from_slice(&self.offset.to_le_bytes());
        buffer
    }

    pub fn from_bytes(bytes: &[u8; INDEX_ENTRY_SIZE]) -> Self {
        let mut key = [0u8; 8];
        let mut offset = [0u8; 8];
        key.copy_from_slice(&bytes[..8]);
        offset.copy_from_slice(&bytes[8..]);
        Self {
            key: u64::from_le_bytes(key),
            offset: u64::from_le_bytes(offset),
        }
    }
}

/// Append-only `(key, offset)` log for one INT column.
///
/// Entries are neither sorted nor deduplicated, so a lookup is a linear scan.
/// A trailing partial record (from an interrupted write) is ignored with a
/// warning: reads stop at the last complete record and the next append or
/// rebuild drops the leftover bytes.
#[derive(Debug, Clone)]
pub struct IndexFile {
    path: PathBuf,
    column: String,
    sync_writes: bool,
}

impl IndexFile {
    pub fn new(path: PathBuf, column: impl Into<String>, sync_writes: bool) -> Self {
        Self {
            path,
            column: column.into(),
            sync_writes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Create the index file, or empty it if it already exists
    pub fn clear(&self) -> Result<(), DatabaseError> {
        let file = File::create(&self.path)?;
        self.finish(file)
    }

    /// Open without truncating, creating an empty file if missing
    pub fn ensure_exists(&self) -> Result<(), DatabaseError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }

    /// Write one record at the end of the last complete one, dropping any
    /// partial record first so later entries stay on 16-byte boundaries
    pub fn append(&self, key: u64, offset: RowOffset) -> Result<(), DatabaseError> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let file_len = file.metadata()?.len();
        let end = file_len - file_len % INDEX_ENTRY_SIZE as u64;
        if end != file_len {
            warn!(
                column = %self.column,
                path = %self.path.display(),
                trailing_bytes = file_len - end,
                "dropping partial index record"
            );
            file.set_len(end)?;
        }
        file.seek(SeekFrom::Start(end))?;
        file.write_all(&IndexEntry::new(key, offset).to_bytes())?;
        self.finish(file)
    }

    /// Every complete entry, in insertion order
    pub fn entries(&self) -> Result<Vec<IndexEntry>, DatabaseError> {
        let mut entries = Vec::new();
        self.for_each_entry(|entry| entries.push(entry))?;
        Ok(entries)
    }

    /// Offsets of every entry whose key equals `key`, in insertion order
    pub fn lookup(&self, key: u64) -> Result<Vec<RowOffset>, DatabaseError> {
        let mut offsets = Vec::new();
        self.for_each_entry(|entry| {
            if entry.key == key {
                offsets.push(entry.offset);
            }
        })?;
        debug!(column = %self.column, key, matches = offsets.len(), "index lookup");
        Ok(offsets)
    }

    /// Replace the whole file with `entries`
    pub fn rebuild<I>(&self, entries: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = IndexEntry>,
    {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let mut count = 0usize;
        for entry in entries {
            writer.write_all(&entry.to_bytes())?;
            count += 1;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        debug!(column = %self.column, entries = count, "index rebuilt");
        self.finish(file)
    }

    pub fn len_bytes(&self) -> Result<u64, DatabaseError> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Cut the file back to `len` bytes, used to roll back a failed insert
    pub fn truncate_to(&self, len: u64) -> Result<(), DatabaseError> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(len)?;
        self.finish(file)
    }

    fn for_each_entry<F>(&self, mut visit: F) -> Result<(), DatabaseError>
    where
        F: FnMut(IndexEntry),
    {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let record_size = INDEX_ENTRY_SIZE as u64;
        if file_len % record_size != 0 {
            warn!(
                column = %self.column,
                path = %self.path.display(),
                trailing_bytes = file_len % record_size,
                "partial index record ignored"
            );
        }

        let mut reader = BufReader::new(file);
        let mut record = [0u8; INDEX_ENTRY_SIZE];
        for _ in 0..file_len / record_size {
            reader.read_exact(&mut record)?;
            visit(IndexEntry::from_bytes(&record));
        }
        Ok(())
    }

    fn finish(&self, file: File) -> Result<(), DatabaseError> {
        if self.sync_writes {
            file.sync_data()?;
        }
        Ok(())
    }
}
