//! Flat-file record repository over an in-memory collection.
//!
//! # Responsibility
//! - Hold the records loaded from a `FileStore` and expose the uniform
//!   repository contract over them.
//! - Persist the collection only through explicit saves to new files.
//!
//! # Invariants
//! - Ids are collection positions; deleting shifts every later id down by one.
//! - Ids are not stable across reloads and are never written to disk.
//! - `ListQuery` pagination is ignored; `load` bounds the rows read instead.

use crate::ingest::parser::SkipReason;
use crate::model::record::Record;
use crate::model::stored::{RecordId, StoredRecord};
use crate::repo::{FilterField, ListQuery, RecordRepository, RepoResult};
use crate::store::file::FileStore;
use std::path::PathBuf;

/// Repository whose backing store is a delimited file.
#[derive(Debug, Clone)]
pub struct FileSampleRepository {
    store: FileStore,
    records: Vec<Record>,
}

impl FileSampleRepository {
    /// Creates an empty repository; call `load` to read the source.
    pub fn new(store: FileStore) -> Self {
        Self::with_records(store, Vec::new())
    }

    pub fn with_records(store: FileStore, records: Vec<Record>) -> Self {
        Self { store, records }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replaces the collection with up to `max_rows` source rows.
    ///
    /// Returns the diagnostics of rows that did not become records.
    pub fn load(&mut self, max_rows: Option<usize>) -> RepoResult<Vec<SkipReason>> {
        let report = self.store.load(max_rows)?;
        self.records = report.records;
        Ok(report.skipped)
    }

    /// Writes the current collection to a new output file.
    pub fn save_to_new_file(&self) -> RepoResult<PathBuf> {
        self.store.save(&self.records)
    }

    fn index_of(&self, id: RecordId) -> Option<usize> {
        usize::try_from(id)
            .ok()
            .filter(|index| *index < self.records.len())
    }
}

impl RecordRepository for FileSampleRepository {
    fn create(&mut self, record: &Record) -> RepoResult<RecordId> {
        self.records.push(record.clone());
        Ok(position_id(self.records.len() - 1))
    }

    fn read_by_id(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        Ok(self
            .index_of(id)
            .map(|index| StoredRecord::untracked(id, self.records[index].clone())))
    }

    fn read_all(&self, _query: &ListQuery) -> RepoResult<Vec<StoredRecord>> {
        Ok(stored(self.records.iter().enumerate()))
    }

    fn read_by_field(&self, field: FilterField, value: &str) -> RepoResult<Vec<StoredRecord>> {
        Ok(stored(
            self.records
                .iter()
                .enumerate()
                .filter(|(_, record)| field.matches(record, value)),
        ))
    }

    fn update(&mut self, id: RecordId, record: &Record) -> RepoResult<bool> {
        match self.index_of(id) {
            Some(index) => {
                self.records[index] = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, id: RecordId) -> RepoResult<bool> {
        match self.index_of(id) {
            Some(index) => {
                self.records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count(&self) -> RepoResult<usize> {
        Ok(self.records.len())
    }

    fn clear(&mut self) -> RepoResult<usize> {
        let removed = self.records.len();
        self.records.clear();
        Ok(removed)
    }
}

fn position_id(index: usize) -> RecordId {
    RecordId::try_from(index).unwrap_or(RecordId::MAX)
}

fn stored<'a>(entries: impl Iterator<Item = (usize, &'a Record)>) -> Vec<StoredRecord> {
    entries
        .map(|(index, record)| StoredRecord::untracked(position_id(index), record.clone()))
        .collect()
}
