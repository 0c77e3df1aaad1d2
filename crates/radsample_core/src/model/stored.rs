//! Store-assigned identity wrapper for persisted records.

use crate::model::record::Record;
use serde::{Deserialize, Serialize};

/// Store-assigned record identity.
///
/// Relational stores hand out monotonic ids that are never reused. The file
/// store uses the position inside the loaded collection, which changes across
/// reloads and after deletes.
pub type RecordId = i64;

/// A record together with its identity and optional audit timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: Record,
    /// Unix epoch milliseconds; relational store only.
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds; relational store only.
    pub updated_at: Option<i64>,
}

impl StoredRecord {
    /// Wraps a record that has identity but no audit trail.
    pub fn untracked(id: RecordId, record: Record) -> Self {
        Self {
            id,
            record,
            created_at: None,
            updated_at: None,
        }
    }
}
