//! Delimited-file reader/writer for measurement records.

use crate::config::DataConfig;
use crate::ingest::parser::{CleaningMode, LoadReport, RowParser, Rows};
use crate::model::record::Record;
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Column header of the source dataset, reproduced on every save.
pub const SOURCE_HEADER: [&str; 9] = [
    "Sample Type/ Type d'échantillon",
    "Type",
    "Start Date/ Date de Début",
    "Stop Date/ Date de Fin",
    "Station Name/ Nom de Station",
    "Province",
    "Sr90 Activity/ Activité (Bq/L)",
    "Sr90 Error/ Erreur (Bq/L)",
    "Sr90 Activity/Calcium / Activité/Calcium (Bq/g)",
];

const OUTPUT_FILE_PREFIX: &str = "samples";

/// Stateless adapter over one source file and one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    source: PathBuf,
    output_dir: PathBuf,
    parser: RowParser,
}

impl FileStore {
    pub fn new(
        source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        cleaning: CleaningMode,
    ) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            parser: RowParser::new(cleaning),
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(&config.source_path, &config.output_dir, config.cleaning)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn parser(&self) -> RowParser {
        self.parser
    }

    /// Starts a lazy pass over the source file.
    pub fn rows(&self) -> RepoResult<Rows<File>> {
        Ok(self.parser.rows(self.open_source()?))
    }

    /// Reads up to `max_rows` data rows from the source.
    ///
    /// Missing or unreadable sources fail with `StoreUnavailable`; bad rows
    /// end up in `LoadReport::skipped`.
    pub fn load(&self, max_rows: Option<usize>) -> RepoResult<LoadReport> {
        let file = self.open_source()?;
        let report = self.parser.load(file, max_rows).map_err(|err| {
            error!(
                "event=file_load module=store status=error path={} error={}",
                self.source.display(),
                err
            );
            RepoError::unavailable(self.source.display().to_string(), err)
        })?;

        info!(
            "event=file_load module=store status=ok path={} rows={} records={} skipped={}",
            self.source.display(),
            report.rows_read,
            report.records.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Writes `records` to a new uniquely named file and returns its path.
    pub fn save(&self, records: &[Record]) -> RepoResult<PathBuf> {
        let unavailable =
            |err: std::io::Error| RepoError::unavailable(self.output_dir.display().to_string(), err);

        std::fs::create_dir_all(&self.output_dir).map_err(unavailable)?;
        let path = self.output_dir.join(format!(
            "{OUTPUT_FILE_PREFIX}_{}.csv",
            Uuid::new_v4().simple()
        ));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(unavailable)?;

        write_records(file, records)
            .map_err(|err| RepoError::unavailable(path.display().to_string(), err))?;

        info!(
            "event=file_save module=store status=ok path={} records={}",
            path.display(),
            records.len()
        );
        Ok(path)
    }

    fn open_source(&self) -> RepoResult<File> {
        File::open(&self.source).map_err(|err| {
            error!(
                "event=file_open module=store status=error path={} error={}",
                self.source.display(),
                err
            );
            RepoError::unavailable(self.source.display().to_string(), err)
        })
    }
}

/// Writes the source header followed by one row per record.
///
/// Absent optional values are written as empty cells.
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(SOURCE_HEADER)?;
    for record in records {
        writer.write_record([
            record.sample_category().to_string(),
            record.sample_subtype().to_string(),
            record.period_start().to_string(),
            record.period_end().to_string(),
            record.station_name().to_string(),
            record.region().to_string(),
            record.activity().to_string(),
            optional_cell(record.activity_error()),
            optional_cell(record.activity_per_calcium()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
