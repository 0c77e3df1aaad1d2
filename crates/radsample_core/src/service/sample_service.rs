//! Sample use-case service.
//!
//! # Responsibility
//! - Provide create/edit/delete/query entry points for callers.
//! - Compute dataset statistics over whatever repository backs it.
//!
//! # Invariants
//! - Edits merge a `RecordPatch` over the stored record and replace it whole.
//! - Service APIs never bypass the repository contract.

use crate::ingest::parser::SkipReason;
use crate::model::patch::RecordPatch;
use crate::model::record::{Record, RecordFields, ValidationError};
use crate::model::stored::{RecordId, StoredRecord};
use crate::repo::file_repo::FileSampleRepository;
use crate::repo::{FilterField, ListQuery, RecordRepository, RepoError, RepoResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Caller-supplied values violate record invariants.
    Validation(ValidationError),
    Repo(RepoError),
    /// A write reported success but the record could not be read back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent sample state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Aggregate figures over every stored sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatistics {
    pub total_samples: usize,
    pub unique_regions: usize,
    pub unique_stations: usize,
    pub regions: Vec<String>,
    pub stations: Vec<String>,
    /// Mean over readings with `activity > 0`; `0.0` when there are none.
    pub average_activity: f64,
    pub valid_activity_readings: usize,
}

/// Use-case wrapper over a record repository.
pub struct SampleService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> SampleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Validates typed input and stores it as a new record.
    pub fn create_sample(&mut self, fields: RecordFields) -> ServiceResult<RecordId> {
        let record = Record::try_from_fields(fields)?;
        Ok(self.repo.create(&record)?)
    }

    pub fn get_sample(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        self.repo.read_by_id(id)
    }

    pub fn list_samples(&self, query: &ListQuery) -> RepoResult<Vec<StoredRecord>> {
        self.repo.read_all(query)
    }

    pub fn samples_by_region(&self, region: &str) -> RepoResult<Vec<StoredRecord>> {
        self.repo.read_by_field(FilterField::Region, region)
    }

    pub fn samples_by_station(&self, station_name: &str) -> RepoResult<Vec<StoredRecord>> {
        self.repo.read_by_field(FilterField::StationName, station_name)
    }

    pub fn sample_count(&self) -> RepoResult<usize> {
        self.repo.count()
    }

    /// Applies `patch` to sample `id`.
    ///
    /// Returns `(previous, replacement)`, or `None` when `id` does not exist.
    pub fn edit_sample(
        &mut self,
        id: RecordId,
        patch: &RecordPatch,
    ) -> ServiceResult<Option<(Record, Record)>> {
        let Some(existing) = self.repo.read_by_id(id)? else {
            return Ok(None);
        };

        let replacement = patch.apply(&existing.record)?;
        if !self.repo.update(id, &replacement)? {
            return Err(ServiceError::InconsistentState(
                "sample disappeared between read and update",
            ));
        }
        Ok(Some((existing.record, replacement)))
    }

    /// Deletes sample `id` and returns the removed record.
    pub fn delete_sample(&mut self, id: RecordId) -> ServiceResult<Option<Record>> {
        let Some(existing) = self.repo.read_by_id(id)? else {
            return Ok(None);
        };

        if !self.repo.delete(id)? {
            return Err(ServiceError::InconsistentState(
                "sample disappeared between read and delete",
            ));
        }
        Ok(Some(existing.record))
    }

    /// Sorted unique region names.
    pub fn available_regions(&self) -> RepoResult<Vec<String>> {
        self.repo.distinct_values(FilterField::Region)
    }

    /// Sorted unique station names.
    pub fn available_stations(&self) -> RepoResult<Vec<String>> {
        self.repo.distinct_values(FilterField::StationName)
    }

    pub fn statistics(&self) -> RepoResult<DatasetStatistics> {
        let samples = self.repo.read_all(&ListQuery::default())?;

        let mut regions = BTreeSet::new();
        let mut stations = BTreeSet::new();
        let mut activity_sum = 0.0;
        let mut valid_activity_readings = 0;
        for stored in &samples {
            regions.insert(stored.record.region().to_string());
            stations.insert(stored.record.station_name().to_string());
            if stored.record.activity() > 0.0 {
                activity_sum += stored.record.activity();
                valid_activity_readings += 1;
            }
        }

        let average_activity = if valid_activity_readings > 0 {
            activity_sum / valid_activity_readings as f64
        } else {
            0.0
        };

        Ok(DatasetStatistics {
            total_samples: self.repo.count()?,
            unique_regions: regions.len(),
            unique_stations: stations.len(),
            regions: regions.into_iter().collect(),
            stations: stations.into_iter().collect(),
            average_activity,
            valid_activity_readings,
        })
    }
}

impl SampleService<FileSampleRepository> {
    /// Discards the in-memory collection and reloads up to `max_rows` rows.
    pub fn reload(&mut self, max_rows: Option<usize>) -> RepoResult<Vec<SkipReason>> {
        self.repo.load(max_rows)
    }

    /// Saves the in-memory collection to a new output file.
    pub fn save_to_new_file(&self) -> RepoResult<PathBuf> {
        self.repo.save_to_new_file()
    }
}
