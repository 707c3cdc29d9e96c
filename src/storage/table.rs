use std::{
    collections::HashSet,
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    config::DatabaseConfig,
    executor::predicate::{BoundPredicate, Predicate, Projection},
    storage::{
        RowStore, data_file_path,
        index::{IndexEntry, IndexFile},
        index_file_path, schema_file_path,
        schema::TableSchema,
    },
    types::{INT_WIDTH, RowOffset, error::DatabaseError, row::Row, value::Value},
};

/// An INT column together with its index file
#[derive(Debug, Clone)]
struct IndexedColumn {
    column_index: usize,
    /// Byte position of the column inside a row slot
    byte_offset: usize,
    file: IndexFile,
}

impl IndexedColumn {
    fn key_in_slot(&self, slot: &[u8]) -> u64 {
        let mut raw = [0u8; INT_WIDTH];
        raw.copy_from_slice(&slot[self.byte_offset..self.byte_offset + INT_WIDTH]);
        u64::from_le_bytes(raw)
    }
}

/// File-backed table: one schema file, one data file of fixed-size row
/// slots, and one index file per INT column.
///
/// No file handle outlives a call. Callers that share a store across threads
/// must serialize access themselves; `Database` does so with a mutex per table.
#[derive(Debug)]
pub struct TableStore {
    schema: TableSchema,
    dir: PathBuf,
    data_path: PathBuf,
    indexes: Vec<IndexedColumn>,
    sync_writes: bool,
}

impl TableStore {
    /// Create a new table, writing its schema file and empty data and index files
    pub fn create(config: &DatabaseConfig, schema: TableSchema) -> Result<Self, DatabaseError> {
        let store = Self::with_schema(config, schema);

        store
            .schema
            .save(&schema_file_path(&store.dir, &store.schema.table_name))?;
        let data_file = File::create(&store.data_path)?;
        store.finish(&data_file)?;
        for indexed in &store.indexes {
            indexed.file.clear()?;
        }

        info!(
            table = %store.schema.table_name,
            row_size = store.schema.row_size(),
            indexes = store.indexes.len(),
            "table created"
        );
        Ok(store)
    }

    /// Open a table previously created in `config.dir`
    pub fn open(config: &DatabaseConfig, table_name: &str) -> Result<Self, DatabaseError> {
        let schema = TableSchema::load(&schema_file_path(&config.dir, table_name), table_name)?;
        let store = Self::with_schema(config, schema);

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&store.data_path)?;
        for indexed in &store.indexes {
            indexed.file.ensure_exists()?;
        }

        info!(table = %table_name, rows = store.row_count()?, "table opened");
        Ok(store)
    }

    fn with_schema(config: &DatabaseConfig, schema: TableSchema) -> Self {
        let dir = config.dir.clone();
        let mut indexes = Vec::new();
        let mut byte_offset = 0;
        for (column_index, column) in schema.columns.iter().enumerate() {
            if column.is_indexed() {
                let path = index_file_path(&dir, &schema.table_name, &column.name);
                indexes.push(IndexedColumn {
                    column_index,
                    byte_offset,
                    file: IndexFile::new(path, column.name.clone(), config.sync_writes),
                });
            }
            byte_offset += column.width();
        }

        Self {
            data_path: data_file_path(&dir, &schema.table_name),
            dir,
            schema,
            indexes,
            sync_writes: config.sync_writes,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Index file of `column_name`, if that column is indexed
    pub fn index_file(&self, column_name: &str) -> Option<&IndexFile> {
        self.indexes
            .iter()
            .find(|indexed| indexed.file.column() == column_name)
            .map(|indexed| &indexed.file)
    }

    fn row_size(&self) -> u64 {
        self.schema.row_size() as u64
    }

    /// Regenerate every index file from the current data file contents
    pub fn rebuild_indexes(&self) -> Result<(), DatabaseError> {
        let mut entries: Vec<Vec<IndexEntry>> = vec![Vec::new(); self.indexes.len()];
        self.for_each_slot(|offset, slot| {
            for (indexed, column_entries) in self.indexes.iter().zip(entries.iter_mut()) {
                column_entries.push(IndexEntry::new(indexed.key_in_slot(slot), offset));
            }
            Ok(())
        })?;

        for (indexed, column_entries) in self.indexes.iter().zip(entries) {
            indexed.file.rebuild(column_entries)?;
        }
        Ok(())
    }

    /// Visit every complete row slot in physical order.
    ///
    /// A trailing partial slot is skipped with a warning.
    fn for_each_slot<F>(&self, mut visit: F) -> Result<(), DatabaseError>
    where
        F: FnMut(RowOffset, &[u8]) -> Result<(), DatabaseError>,
    {
        let file = File::open(&self.data_path)?;
        let file_len = file.metadata()?.len();
        let row_size = self.row_size();
        if file_len % row_size != 0 {
            warn!(
                table = %self.schema.table_name,
                trailing_bytes = file_len % row_size,
                "partial row at end of data file ignored"
            );
        }

        let mut reader = BufReader::new(file);
        let mut slot = vec![0u8; self.schema.row_size()];
        for slot_index in 0..file_len / row_size {
            reader.read_exact(&mut slot)?;
            visit(slot_index * row_size, &slot)?;
        }
        Ok(())
    }

    /// Read the row slot at `offset`, or `None` if the offset does not name one
    fn read_row_at(&self, file: &mut File, file_len: u64, offset: RowOffset) -> Result<Option<Row>, DatabaseError> {
        let row_size = self.row_size();
        if offset % row_size != 0 || offset.checked_add(row_size).is_none_or(|end| end > file_len) {
            warn!(
                table = %self.schema.table_name,
                offset,
                file_len,
                "index entry does not point at a row slot"
            );
            return Ok(None);
        }

        let mut slot = vec![0u8; self.schema.row_size()];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut slot)?;
        Row::from_bytes(&slot, &self.schema).map(Some)
    }

    fn select_by_index(
        &self,
        predicate: &BoundPredicate,
        key: u64,
        indices: &[usize],
    ) -> Result<Vec<Row>, DatabaseError> {
        let Some(indexed) = self
            .indexes
            .iter()
            .find(|indexed| indexed.column_index == predicate.column_index)
        else {
            return self.select_by_scan(Some(predicate), indices);
        };

        let offsets = indexed.file.lookup(key)?;
        if offsets.is_empty() {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.data_path)?;
        let file_len = file.metadata()?.len();
        let mut rows = Vec::with_capacity(offsets.len());
        for offset in offsets {
            if let Some(row) = self.read_row_at(&mut file, file_len, offset)? {
                if predicate.matches(&row) {
                    rows.push(row.project(indices));
                } else {
                    warn!(table = %self.schema.table_name, offset, key, "stale index entry skipped");
                }
            }
        }
        Ok(rows)
    }

    fn select_by_scan(
        &self,
        predicate: Option<&BoundPredicate>,
        indices: &[usize],
    ) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::new();
        self.for_each_slot(|_, slot| {
            let row = Row::from_bytes(slot, &self.schema)?;
            if predicate.is_none_or(|p| p.matches(&row)) {
                rows.push(row.project(indices));
            }
            Ok(())
        })?;
        Ok(rows)
    }

    /// Rewrite the data file keeping only slots for which `keep` holds.
    /// Returns the number of dropped slots.
    fn rewrite_data_file<F>(&self, mut keep: F) -> Result<usize, DatabaseError>
    where
        F: FnMut(RowOffset, &[u8]) -> Result<bool, DatabaseError>,
    {
        let temp = NamedTempFile::new_in(&self.dir)?;
        let mut writer = BufWriter::new(temp);
        let mut removed = 0;
        self.for_each_slot(|offset, slot| {
            if keep(offset, slot)? {
                writer.write_all(slot)?;
            } else {
                removed += 1;
            }
            Ok(())
        })?;

        let temp = writer.into_inner().map_err(|e| e.into_error())?;
        self.finish(temp.as_file())?;
        temp.persist(&self.data_path).map_err(|e| e.error)?;
        Ok(removed)
    }

    fn truncate_all(&self) -> Result<(), DatabaseError> {
        let data_file = File::create(&self.data_path)?;
        self.finish(&data_file)?;
        for indexed in &self.indexes {
            indexed.file.clear()?;
        }
        Ok(())
    }

    /// Best effort undo of a half-finished insert
    fn rollback_insert(&self, data_len: u64, index_lens: &[u64]) {
        let data_result = OpenOptions::new()
            .write(true)
            .open(&self.data_path)
            .and_then(|file| file.set_len(data_len));
        if let Err(e) = data_result {
            warn!(table = %self.schema.table_name, error = %e, "failed to roll back data file");
        }
        for (indexed, &len) in self.indexes.iter().zip(index_lens) {
            if let Err(e) = indexed.file.truncate_to(len) {
                warn!(table = %self.schema.table_name, column = %indexed.file.column(), error = %e, "failed to roll back index file");
            }
        }
    }

    fn finish(&self, file: &File) -> Result<(), DatabaseError> {
        if self.sync_writes {
            file.sync_data()?;
        }
        Ok(())
    }
}

impl RowStore for TableStore {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn insert(&mut self, values: Vec<Value>) -> Result<(), DatabaseError> {
        let row = Row::new(values);
        let row_bytes = row.to_bytes(&self.schema)?;

        let index_lens = self
            .indexes
            .iter()
            .map(|indexed| indexed.file.len_bytes())
            .collect::<Result<Vec<_>, _>>()?;

        let mut file = OpenOptions::new().read(true).write(true).open(&self.data_path)?;
        let file_len = file.metadata()?.len();
        let offset = file_len - file_len % self.row_size();
        if offset != file_len {
            warn!(
                table = %self.schema.table_name,
                trailing_bytes = file_len - offset,
                "dropping partial row at end of data file"
            );
            file.set_len(offset)?;
        }
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&row_bytes)?;
        self.finish(&file)?;
        drop(file);

        for indexed in &self.indexes {
            let appended = match row.values[indexed.column_index].as_int() {
                Some(key) => indexed.file.append(key, offset),
                None => Ok(()),
            };
            if let Err(e) = appended {
                self.rollback_insert(offset, &index_lens);
                return Err(e);
            }
        }

        debug!(table = %self.schema.table_name, offset, "row inserted");
        Ok(())
    }

    fn select(
        &self,
        projection: &Projection,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Row>, DatabaseError> {
        let indices = projection.resolve(&self.schema)?;
        let bound = predicate.map(|p| p.bind(&self.schema)).transpose()?;

        match &bound {
            Some(p) => match p.index_key() {
                Some(key) => self.select_by_index(p, key, &indices),
                None => self.select_by_scan(Some(p), &indices),
            },
            None => self.select_by_scan(None, &indices),
        }
    }

    fn delete(&mut self, predicate: Option<&Predicate>) -> Result<usize, DatabaseError> {
        let Some(predicate) = predicate else {
            let removed = self.row_count()?;
            self.truncate_all()?;
            debug!(table = %self.schema.table_name, removed, "table emptied");
            return Ok(removed);
        };

        let bound = predicate.bind(&self.schema)?;
        let indexed = bound.index_key().and_then(|key| {
            self.indexes
                .iter()
                .find(|indexed| indexed.column_index == bound.column_index)
                .map(|indexed| (indexed, key))
        });

        let removed = match indexed {
            Some((indexed, key)) => {
                let doomed: HashSet<RowOffset> = indexed.file.lookup(key)?.into_iter().collect();
                if doomed.is_empty() {
                    return Ok(0);
                }
                self.rewrite_data_file(|offset, slot| {
                    if !doomed.contains(&offset) {
                        return Ok(true);
                    }
                    // A stale entry may point at some other row
                    Ok(!bound.matches(&Row::from_bytes(slot, &self.schema)?))
                })?
            }
            None => self.rewrite_data_file(|_, slot| {
                let row = Row::from_bytes(slot, &self.schema)?;
                Ok(!bound.matches(&row))
            })?,
        };

        // Every slot after a removed one moved, so all indexes are stale
        self.rebuild_indexes()?;
        debug!(table = %self.schema.table_name, removed, "rows deleted");
        Ok(removed)
    }

    fn row_count(&self) -> Result<usize, DatabaseError> {
        let file_len = std::fs::metadata(&self.data_path)?.len();
        Ok((file_len / self.row_size()) as usize)
    }
}
