//! Measurement domain model.
//!
//! # Responsibility
//! - Define the validated record shared by every store adapter.
//! - Define store identity and the partial-update patch shape.
//!
//! # Invariants
//! - A `Record` only exists after coercion and validation succeed.
//! - Updates go through `RecordPatch` and produce a new `Record`.

pub mod patch;
pub mod record;
pub mod stored;
