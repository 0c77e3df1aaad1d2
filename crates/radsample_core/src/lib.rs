//! Ingestion and persistence core for environmental radioactivity samples.
//!
//! Raw delimited rows become validated `Record`s, which are stored either in
//! a flat file or in SQLite behind one `RecordRepository` contract. The
//! `reconcile` module copies the file dataset into SQLite and checks counts.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{load_config, parse_config, ConfigError, CoreConfig};
pub use ingest::parser::{
    CleaningMode, LoadReport, ParseError, RowOutcome, RowParser, Rows, SkipKind, SkipReason,
};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::patch::RecordPatch;
pub use model::record::{RawRecord, Record, RecordField, RecordFields, ValidationError};
pub use model::stored::{RecordId, StoredRecord};
pub use reconcile::migrator::{MigrationReport, MigrationStatistics, Migrator};
pub use repo::file_repo::FileSampleRepository;
pub use repo::sample_repo::SqliteSampleRepository;
pub use repo::{
    BatchFailure, BatchOutcome, FilterField, ListQuery, RecordRepository, RepoError, RepoResult,
};
pub use service::sample_service::{DatasetStatistics, SampleService, ServiceError};
pub use store::file::{write_records, FileStore, SOURCE_HEADER};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
