//! Uniform record repository contract and its store-backed implementations.
//!
//! # Responsibility
//! - Define one CRUD/query contract shared by the flat-file and SQLite stores.
//! - Translate store failures into semantic repository errors.
//!
//! # Invariants
//! - Missing ids are reported as `Ok(None)` / `Ok(false)`, never as errors.
//! - Store unavailability and corrupt persisted rows are fatal errors.
//! - Listing is ordered by id ascending.

use crate::db::DbError;
use crate::model::record::{Record, RecordField};
use crate::model::stored::{RecordId, StoredRecord};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod file_repo;
pub mod sample_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure. Every variant aborts the current operation.
#[derive(Debug)]
pub enum RepoError {
    /// Backing file or database cannot be reached.
    StoreUnavailable {
        location: String,
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// A persisted row violates record invariants.
    CorruptRecord {
        id: Option<RecordId>,
        message: String,
    },
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn unavailable(
        location: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::StoreUnavailable {
            location: location.into(),
            source: source.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable { location, source } => {
                write!(f, "store unavailable at `{location}`: {source}")
            }
            Self::CorruptRecord {
                id: Some(id),
                message,
            } => write!(f, "corrupt stored record {id}: {message}"),
            Self::CorruptRecord { id: None, message } => {
                write!(f, "corrupt stored data: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable { source, .. } => Some(source.as_ref()),
            Self::Db(err) => Some(err),
            Self::CorruptRecord { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Unavailable { path, source } => {
                Self::unavailable(path.display().to_string(), source)
            }
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Text fields usable for exact-match filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    SampleCategory,
    SampleSubtype,
    PeriodStart,
    PeriodEnd,
    StationName,
    Region,
}

impl FilterField {
    pub fn record_field(self) -> RecordField {
        match self {
            Self::SampleCategory => RecordField::SampleCategory,
            Self::SampleSubtype => RecordField::SampleSubtype,
            Self::PeriodStart => RecordField::PeriodStart,
            Self::PeriodEnd => RecordField::PeriodEnd,
            Self::StationName => RecordField::StationName,
            Self::Region => RecordField::Region,
        }
    }

    /// Returns whether `record` holds exactly `value` in this field.
    pub fn matches(self, record: &Record, value: &str) -> bool {
        record.text(self.record_field()) == Some(value)
    }
}

/// Pagination for `read_all`. Only the SQLite store honours it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One record of a batch that could not be stored.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the record inside the submitted batch.
    pub index: usize,
    pub error: RepoError,
}

/// Per-record results of `create_batch`.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<RecordId>,
    pub failures: Vec<BatchFailure>,
}

/// CRUD/query contract shared by every record store.
pub trait RecordRepository {
    /// Stores a new record and returns its freshly assigned id.
    fn create(&mut self, record: &Record) -> RepoResult<RecordId>;

    /// Stores many records; a failing record is reported, not propagated.
    ///
    /// Errors returned from this method are batch-level and fatal.
    fn create_batch(&mut self, records: &[Record]) -> RepoResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for (index, record) in records.iter().enumerate() {
            match self.create(record) {
                Ok(id) => outcome.created.push(id),
                Err(error) => outcome.failures.push(BatchFailure { index, error }),
            }
        }
        Ok(outcome)
    }

    fn read_by_id(&self, id: RecordId) -> RepoResult<Option<StoredRecord>>;

    /// Lists records ordered by id ascending.
    fn read_all(&self, query: &ListQuery) -> RepoResult<Vec<StoredRecord>>;

    /// Exact-match filter on one text field, ordered by id ascending.
    fn read_by_field(&self, field: FilterField, value: &str) -> RepoResult<Vec<StoredRecord>>;

    /// Replaces every field of `id`. Returns `false` when `id` is absent.
    fn update(&mut self, id: RecordId, record: &Record) -> RepoResult<bool>;

    /// Removes `id`. Returns `false` when `id` is absent.
    fn delete(&mut self, id: RecordId) -> RepoResult<bool>;

    /// Sorted distinct values of one text field.
    fn distinct_values(&self, field: FilterField) -> RepoResult<Vec<String>> {
        let values: BTreeSet<String> = self
            .read_all(&ListQuery::default())?
            .iter()
            .filter_map(|stored| stored.record.text(field.record_field()))
            .map(str::to_string)
            .collect();
        Ok(values.into_iter().collect())
    }

    fn count(&self) -> RepoResult<usize>;

    /// Removes every record and returns how many were removed.
    fn clear(&mut self) -> RepoResult<usize>;
}

impl<R: RecordRepository + ?Sized> RecordRepository for &mut R {
    fn create(&mut self, record: &Record) -> RepoResult<RecordId> {
        (**self).create(record)
    }

    fn create_batch(&mut self, records: &[Record]) -> RepoResult<BatchOutcome> {
        (**self).create_batch(records)
    }

    fn read_by_id(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        (**self).read_by_id(id)
    }

    fn read_all(&self, query: &ListQuery) -> RepoResult<Vec<StoredRecord>> {
        (**self).read_all(query)
    }

    fn read_by_field(&self, field: FilterField, value: &str) -> RepoResult<Vec<StoredRecord>> {
        (**self).read_by_field(field, value)
    }

    fn update(&mut self, id: RecordId, record: &Record) -> RepoResult<bool> {
        (**self).update(id, record)
    }

    fn delete(&mut self, id: RecordId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn distinct_values(&self, field: FilterField) -> RepoResult<Vec<String>> {
        (**self).distinct_values(field)
    }

    fn count(&self) -> RepoResult<usize> {
        (**self).count()
    }

    fn clear(&mut self) -> RepoResult<usize> {
        (**self).clear()
    }
}
