//! Lenient row parser backed by the `csv` reader.
//!
//! # Responsibility
//! - Discard the header row and number data rows from 1.
//! - Clean cells according to `CleaningMode` before positional assignment.
//! - Offer a lazy row sequence plus an eager `load` helper.
//!
//! # Invariants
//! - Decoding never fails: invalid UTF-8 is replaced, not raised.
//! - The row counter restarts for every call to `rows`/`load`.
//! - A row needs the seven required positions; missing trailing optional
//!   cells are treated as empty.
//! - In `DropEmpty` mode a row with fewer than nine non-empty cells is only
//!   accepted when every empty cell is trailing, so no value changes column.

use crate::model::record::{
    RawRecord, Record, ValidationError, FIELD_COUNT, REQUIRED_FIELD_COUNT,
};
use csv::{ByteRecord, ReaderBuilder};
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;

/// How empty cells are treated before fields are assigned by position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningMode {
    /// Drop empty cells, then assign remaining cells by position.
    ///
    /// An empty interior cell shifts every later column left.
    #[default]
    DropEmpty,
    /// Keep every cell in place; empty cells stay explicit empties.
    PreserveIndex,
}

impl CleaningMode {
    /// Cell count reported as `required` when a row is too short.
    pub fn required_cells(self) -> usize {
        match self {
            Self::DropEmpty => FIELD_COUNT,
            Self::PreserveIndex => REQUIRED_FIELD_COUNT,
        }
    }
}

/// Why a data row did not become a record.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipKind {
    /// Fewer usable cells than required positions.
    InsufficientValues { found: usize, required: usize },
    /// Cells were present but failed record validation.
    Invalid(ValidationError),
}

impl SkipKind {
    /// Short machine-friendly label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsufficientValues { .. } => "insufficient_values",
            Self::Invalid(ValidationError::MissingField(_)) => "missing_field",
            Self::Invalid(ValidationError::NumericFormat { .. }) => "numeric_format",
            Self::Invalid(ValidationError::Range { .. }) => "range",
        }
    }
}

impl Display for SkipKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientValues { found, required } => {
                write!(f, "expected at least {required} values, found {found}")
            }
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

/// Diagnostic for one rejected data row.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipReason {
    /// 1-based data row index; the header is not counted.
    pub row_number: u64,
    pub kind: SkipKind,
    /// Decoded cells exactly as read, before trimming or dropping.
    pub raw_values: Vec<String>,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row_number, self.kind)
    }
}

/// Result of parsing a single data row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed { row_number: u64, record: Record },
    Skipped(SkipReason),
}

/// Source-level read failure (I/O below the CSV reader).
#[derive(Debug)]
pub struct ParseError {
    row_number: u64,
    source: csv::Error,
}

impl ParseError {
    /// Last data row read successfully before the failure.
    pub fn row_number(&self) -> u64 {
        self.row_number
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to read source after row {}: {}",
            self.row_number, self.source
        )
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Records and diagnostics collected from one pass over a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<Record>,
    pub skipped: Vec<SkipReason>,
    /// Data rows consumed, accepted or not.
    pub rows_read: usize,
}

/// Stateless row parser; all per-pass state lives in `Rows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowParser {
    cleaning: CleaningMode,
}

impl RowParser {
    pub fn new(cleaning: CleaningMode) -> Self {
        Self { cleaning }
    }

    pub fn cleaning(&self) -> CleaningMode {
        self.cleaning
    }

    /// Parses one data row given as raw cells.
    pub fn parse_row<S: AsRef<str>>(
        &self,
        row_number: u64,
        cells: &[S],
    ) -> Result<Record, SkipReason> {
        let skip = |kind: SkipKind| SkipReason {
            row_number,
            kind,
            raw_values: cells.iter().map(|cell| cell.as_ref().to_string()).collect(),
        };

        let cleaned = clean_cells(cells, self.cleaning);
        if !has_required_cells(cells, cleaned.len(), self.cleaning) {
            return Err(skip(SkipKind::InsufficientValues {
                found: cleaned.len(),
                required: self.cleaning.required_cells(),
            }));
        }

        Record::construct(&RawRecord::from_cells(&cleaned))
            .map_err(|err| skip(SkipKind::Invalid(err)))
    }

    /// Starts a lazy pass over `reader`. The first line is the header.
    pub fn rows<R: Read>(&self, reader: R) -> Rows<R> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Rows {
            reader,
            buffer: ByteRecord::new(),
            parser: *self,
            row_number: 0,
            finished: false,
        }
    }

    /// Drains up to `max_rows` data rows into a `LoadReport`.
    pub fn load<R: Read>(
        &self,
        reader: R,
        max_rows: Option<usize>,
    ) -> Result<LoadReport, ParseError> {
        let mut report = LoadReport::default();
        let limit = max_rows.unwrap_or(usize::MAX);

        for outcome in self.rows(reader).take(limit) {
            report.rows_read += 1;
            match outcome? {
                RowOutcome::Parsed { record, .. } => report.records.push(record),
                RowOutcome::Skipped(reason) => {
                    debug!(
                        "event=row_skip module=ingest status=skipped row={} reason={}",
                        reason.row_number,
                        reason.kind.label()
                    );
                    report.skipped.push(reason);
                }
            }
        }

        Ok(report)
    }
}

/// Lazy sequence of parsed rows over one source handle.
pub struct Rows<R> {
    reader: csv::Reader<R>,
    buffer: ByteRecord,
    parser: RowParser,
    row_number: u64,
    finished: bool,
}

impl<R: Read> Iterator for Rows<R> {
    type Item = Result<RowOutcome, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_byte_record(&mut self.buffer) {
            Ok(true) => {
                self.row_number += 1;
                let cells = decode_cells(&self.buffer);
                let outcome = match self.parser.parse_row(self.row_number, &cells) {
                    Ok(record) => RowOutcome::Parsed {
                        row_number: self.row_number,
                        record,
                    },
                    Err(reason) => RowOutcome::Skipped(reason),
                };
                Some(Ok(outcome))
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(source) => {
                self.finished = true;
                Some(Err(ParseError {
                    row_number: self.row_number,
                    source,
                }))
            }
        }
    }
}

fn decode_cells(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|cell| String::from_utf8_lossy(cell).into_owned())
        .collect()
}

fn clean_cells<S: AsRef<str>>(cells: &[S], mode: CleaningMode) -> Vec<&str> {
    let trimmed = cells.iter().map(|cell| cell.as_ref().trim());
    match mode {
        CleaningMode::DropEmpty => trimmed.filter(|cell| !cell.is_empty()).collect(),
        CleaningMode::PreserveIndex => trimmed.collect(),
    }
}

// Short rows pass only when their non-empty cells form a prefix of at least
// the required positions; the missing tail then maps to absent optionals.
fn has_required_cells<S: AsRef<str>>(cells: &[S], cleaned: usize, mode: CleaningMode) -> bool {
    match mode {
        CleaningMode::PreserveIndex => cleaned >= REQUIRED_FIELD_COUNT,
        CleaningMode::DropEmpty => {
            cleaned >= FIELD_COUNT
                || (cleaned >= REQUIRED_FIELD_COUNT
                    && cells
                        .iter()
                        .take(cleaned)
                        .all(|cell| !cell.as_ref().trim().is_empty()))
        }
    }
}
