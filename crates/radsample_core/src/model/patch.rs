//! Partial update model for records.
//!
//! # Invariants
//! - Unset patch fields keep the previous record value.
//! - The merged result is validated like any freshly built record.

use crate::model::record::{Record, RecordFields, ValidationError};
use serde::{Deserialize, Serialize};

/// Field-by-field replacement set.
///
/// The two optional numeric fields use a nested `Option`: `Some(None)` clears
/// the stored value, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub sample_category: Option<String>,
    pub sample_subtype: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub station_name: Option<String>,
    pub region: Option<String>,
    pub activity: Option<f64>,
    pub activity_error: Option<Option<f64>>,
    pub activity_per_calcium: Option<Option<f64>>,
}

impl RecordPatch {
    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges this patch over `base` and validates the result.
    pub fn apply(&self, base: &Record) -> Result<Record, ValidationError> {
        let current = base.to_fields();
        Record::try_from_fields(RecordFields {
            sample_category: pick(&self.sample_category, current.sample_category),
            sample_subtype: pick(&self.sample_subtype, current.sample_subtype),
            period_start: pick(&self.period_start, current.period_start),
            period_end: pick(&self.period_end, current.period_end),
            station_name: pick(&self.station_name, current.station_name),
            region: pick(&self.region, current.region),
            activity: self.activity.unwrap_or(current.activity),
            activity_error: self.activity_error.unwrap_or(current.activity_error),
            activity_per_calcium: self
                .activity_per_calcium
                .unwrap_or(current.activity_per_calcium),
        })
    }
}

fn pick(replacement: &Option<String>, previous: String) -> String {
    replacement.clone().unwrap_or(previous)
}
