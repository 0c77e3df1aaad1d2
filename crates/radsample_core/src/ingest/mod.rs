//! Source ingestion: raw delimited rows to validated records.
//!
//! # Responsibility
//! - Decode source bytes permissively and split them into cells.
//! - Turn each data row into a `Record` or an explicit `SkipReason`.
//!
//! # Invariants
//! - One malformed row never aborts a load.
//! - Every rejected row leaves a `SkipReason` with its raw cells.

pub mod parser;
