//! File-to-database migration and count reconciliation.
//!
//! # Responsibility
//! - Copy every parsed source record into a destination repository in batches.
//! - Verify that source and destination agree on record count.
//!
//! # Invariants
//! - Skipped source rows never count as failed inserts.
//! - A single failed insert never aborts the migration.
//! - An unreachable source or destination aborts immediately.

pub mod migrator;
