//! Flat-file store adapter.
//!
//! # Responsibility
//! - Read the delimited source through the row parser.
//! - Write record sets to freshly named output files.
//!
//! # Invariants
//! - The adapter is stateless; every load re-reads the source.
//! - Output files are never overwritten.

pub mod file;
