//! Measurement record model and coercion rules.
//!
//! # Responsibility
//! - Define the validated unit produced by ingestion and consumed by stores.
//! - Own the raw-string to typed-field coercion policy.
//!
//! # Invariants
//! - All six text fields are non-empty after trimming.
//! - `activity` is finite and `>= 0.0`; empty or unparseable input is `0.0`.
//! - `activity_error` is absent or a finite number `>= 0.0`.
//! - `activity_per_calcium` is absent or a finite number.
//! - Fields are private; a changed record is always a new value.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of positional fields in one source row.
pub const FIELD_COUNT: usize = 9;

/// Number of leading positions that must be filled (six text fields plus activity).
pub const REQUIRED_FIELD_COUNT: usize = 7;

/// Names every positional field of a measurement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    SampleCategory,
    SampleSubtype,
    PeriodStart,
    PeriodEnd,
    StationName,
    Region,
    Activity,
    ActivityError,
    ActivityPerCalcium,
}

impl RecordField {
    /// All fields in source column order.
    pub const ALL: [RecordField; FIELD_COUNT] = [
        Self::SampleCategory,
        Self::SampleSubtype,
        Self::PeriodStart,
        Self::PeriodEnd,
        Self::StationName,
        Self::Region,
        Self::Activity,
        Self::ActivityError,
        Self::ActivityPerCalcium,
    ];

    /// Stable snake_case name, shared with the SQL column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SampleCategory => "sample_category",
            Self::SampleSubtype => "sample_subtype",
            Self::PeriodStart => "period_start",
            Self::PeriodEnd => "period_end",
            Self::StationName => "station_name",
            Self::Region => "region",
            Self::Activity => "activity",
            Self::ActivityError => "activity_error",
            Self::ActivityPerCalcium => "activity_per_calcium",
        }
    }
}

impl Display for RecordField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record-level validation failure. Recoverable: the row is skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    MissingField(RecordField),
    /// A non-empty optional numeric cell is not a finite number.
    NumericFormat { field: RecordField, value: String },
    /// A numeric value is outside its permitted range.
    Range { field: RecordField, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is empty"),
            Self::NumericFormat { field, value } => {
                write!(f, "field `{field}` is not a number: `{value}`")
            }
            Self::Range { field, value } => {
                write!(f, "field `{field}` is out of range: {value}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Nine raw cells in source column order, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub sample_category: String,
    pub sample_subtype: String,
    pub period_start: String,
    pub period_end: String,
    pub station_name: String,
    pub region: String,
    pub activity: String,
    pub activity_error: String,
    pub activity_per_calcium: String,
}

impl RawRecord {
    /// Builds a raw record from positional cells.
    ///
    /// Cells past the ninth are ignored; missing trailing cells become empty.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |index: usize| {
            cells
                .get(index)
                .map(|value| value.as_ref().to_string())
                .unwrap_or_default()
        };
        Self {
            sample_category: cell(0),
            sample_subtype: cell(1),
            period_start: cell(2),
            period_end: cell(3),
            station_name: cell(4),
            region: cell(5),
            activity: cell(6),
            activity_error: cell(7),
            activity_per_calcium: cell(8),
        }
    }
}

/// Typed input for building a record outside the parsing path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    pub sample_category: String,
    pub sample_subtype: String,
    pub period_start: String,
    pub period_end: String,
    pub station_name: String,
    pub region: String,
    pub activity: f64,
    pub activity_error: Option<f64>,
    pub activity_per_calcium: Option<f64>,
}

/// One validated measurement event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields", into = "RecordFields")]
pub struct Record {
    sample_category: String,
    sample_subtype: String,
    period_start: String,
    period_end: String,
    station_name: String,
    region: String,
    activity: f64,
    activity_error: Option<f64>,
    activity_per_calcium: Option<f64>,
}

impl Record {
    /// Coerces nine raw cells into a validated record.
    ///
    /// Order: trim, required text check, numeric coercion, range check.
    /// `activity` never fails coercion: empty or unparseable text becomes `0.0`.
    pub fn construct(raw: &RawRecord) -> Result<Self, ValidationError> {
        let fields = RecordFields {
            sample_category: raw.sample_category.trim().to_string(),
            sample_subtype: raw.sample_subtype.trim().to_string(),
            period_start: raw.period_start.trim().to_string(),
            period_end: raw.period_end.trim().to_string(),
            station_name: raw.station_name.trim().to_string(),
            region: raw.region.trim().to_string(),
            activity: 0.0,
            activity_error: None,
            activity_per_calcium: None,
        };
        ensure_text_fields(&fields)?;

        Self::try_from_fields(RecordFields {
            activity: coerce_activity(&raw.activity),
            activity_error: coerce_optional(RecordField::ActivityError, &raw.activity_error)?,
            activity_per_calcium: coerce_optional(
                RecordField::ActivityPerCalcium,
                &raw.activity_per_calcium,
            )?,
            ..fields
        })
    }

    /// Validates already-typed fields. Text fields are trimmed first.
    pub fn try_from_fields(fields: RecordFields) -> Result<Self, ValidationError> {
        let fields = RecordFields {
            sample_category: fields.sample_category.trim().to_string(),
            sample_subtype: fields.sample_subtype.trim().to_string(),
            period_start: fields.period_start.trim().to_string(),
            period_end: fields.period_end.trim().to_string(),
            station_name: fields.station_name.trim().to_string(),
            region: fields.region.trim().to_string(),
            ..fields
        };
        ensure_text_fields(&fields)?;

        if !fields.activity.is_finite() || fields.activity < 0.0 {
            return Err(ValidationError::Range {
                field: RecordField::Activity,
                value: fields.activity,
            });
        }
        if let Some(error) = fields.activity_error {
            if !error.is_finite() || error < 0.0 {
                return Err(ValidationError::Range {
                    field: RecordField::ActivityError,
                    value: error,
                });
            }
        }
        if let Some(ratio) = fields.activity_per_calcium {
            if !ratio.is_finite() {
                return Err(ValidationError::Range {
                    field: RecordField::ActivityPerCalcium,
                    value: ratio,
                });
            }
        }

        Ok(Self {
            sample_category: fields.sample_category,
            sample_subtype: fields.sample_subtype,
            period_start: fields.period_start,
            period_end: fields.period_end,
            station_name: fields.station_name,
            region: fields.region,
            activity: fields.activity,
            activity_error: fields.activity_error,
            activity_per_calcium: fields.activity_per_calcium,
        })
    }

    pub fn sample_category(&self) -> &str {
        &self.sample_category
    }

    pub fn sample_subtype(&self) -> &str {
        &self.sample_subtype
    }

    pub fn period_start(&self) -> &str {
        &self.period_start
    }

    pub fn period_end(&self) -> &str {
        &self.period_end
    }

    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Activity in Bq/L.
    pub fn activity(&self) -> f64 {
        self.activity
    }

    pub fn activity_error(&self) -> Option<f64> {
        self.activity_error
    }

    /// Activity per calcium in Bq/g.
    pub fn activity_per_calcium(&self) -> Option<f64> {
        self.activity_per_calcium
    }

    /// Returns the value of a text field, or `None` for numeric fields.
    pub fn text(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::SampleCategory => Some(&self.sample_category),
            RecordField::SampleSubtype => Some(&self.sample_subtype),
            RecordField::PeriodStart => Some(&self.period_start),
            RecordField::PeriodEnd => Some(&self.period_end),
            RecordField::StationName => Some(&self.station_name),
            RecordField::Region => Some(&self.region),
            RecordField::Activity
            | RecordField::ActivityError
            | RecordField::ActivityPerCalcium => None,
        }
    }

    /// Copies the record back into its typed input shape.
    pub fn to_fields(&self) -> RecordFields {
        self.clone().into()
    }
}

impl From<Record> for RecordFields {
    fn from(value: Record) -> Self {
        Self {
            sample_category: value.sample_category,
            sample_subtype: value.sample_subtype,
            period_start: value.period_start,
            period_end: value.period_end,
            station_name: value.station_name,
            region: value.region,
            activity: value.activity,
            activity_error: value.activity_error,
            activity_per_calcium: value.activity_per_calcium,
        }
    }
}

impl TryFrom<RecordFields> for Record {
    type Error = ValidationError;

    fn try_from(value: RecordFields) -> Result<Self, Self::Error> {
        Self::try_from_fields(value)
    }
}

fn ensure_text_fields(fields: &RecordFields) -> Result<(), ValidationError> {
    let text_fields = [
        (RecordField::SampleCategory, &fields.sample_category),
        (RecordField::SampleSubtype, &fields.sample_subtype),
        (RecordField::PeriodStart, &fields.period_start),
        (RecordField::PeriodEnd, &fields.period_end),
        (RecordField::StationName, &fields.station_name),
        (RecordField::Region, &fields.region),
    ];
    for (field, value) in text_fields {
        if value.is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    Ok(())
}

// Unparseable or non-finite activity is kept as 0.0 rather than rejected;
// negative values still fail later in the range check.
fn coerce_activity(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn coerce_optional(field: RecordField, raw: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ValidationError::NumericFormat {
            field,
            value: trimmed.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{coerce_activity, coerce_optional, RecordField, ValidationError};

    #[test]
    fn coerce_activity_defaults_to_zero() {
        assert_eq!(coerce_activity(""), 0.0);
        assert_eq!(coerce_activity("  "), 0.0);
        assert_eq!(coerce_activity("n/a"), 0.0);
        assert_eq!(coerce_activity("inf"), 0.0);
        assert_eq!(coerce_activity(" 1.2e-3 "), 0.0012);
    }

    #[test]
    fn coerce_optional_rejects_non_finite_values() {
        let err = coerce_optional(RecordField::ActivityError, "NaN").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NumericFormat {
                field: RecordField::ActivityError,
                ..
            }
        ));
        assert_eq!(
            coerce_optional(RecordField::ActivityError, "").unwrap(),
            None
        );
    }
}
