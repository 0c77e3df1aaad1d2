//! Batched copy from a `FileStore` into any `RecordRepository`.

use crate::ingest::parser::SkipReason;
use crate::repo::{ListQuery, RecordRepository, RepoResult};
use crate::store::file::FileStore;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;

/// Outcome of one `migrate` run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    /// Records parsed from the source.
    pub total_parsed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Source rows that never became records.
    pub skipped: Vec<SkipReason>,
    pub batches: usize,
    pub destination_count: usize,
    /// `destination_count == succeeded` after the run.
    pub verified: bool,
}

impl MigrationReport {
    /// `(total_parsed, succeeded, failed)`.
    pub fn totals(&self) -> (usize, usize, usize) {
        (self.total_parsed, self.succeeded, self.failed)
    }
}

/// Snapshot comparing the source with the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatistics {
    pub source_record_count: usize,
    pub destination_record_count: usize,
    pub unique_regions: usize,
    pub unique_stations: usize,
    pub regions: Vec<String>,
    pub stations: Vec<String>,
    pub counts_match: bool,
}

/// Migration driver bound to one source and one destination.
pub struct Migrator<'a, R: RecordRepository> {
    source: &'a FileStore,
    destination: R,
}

impl<'a, R: RecordRepository> Migrator<'a, R> {
    pub fn new(source: &'a FileStore, destination: R) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn destination(&self) -> &R {
        &self.destination
    }

    pub fn into_destination(self) -> R {
        self.destination
    }

    /// Replaces the destination contents with every parsed source record.
    ///
    /// The source is parsed before the destination is cleared, so an
    /// unreadable source leaves the destination untouched. `batch_size` of 0
    /// is treated as 1.
    pub fn migrate(&mut self, batch_size: usize) -> RepoResult<MigrationReport> {
        let started_at = Instant::now();
        let batch_size = batch_size.max(1);
        info!(
            "event=migrate module=reconcile status=start source={} batch_size={}",
            self.source.source().display(),
            batch_size
        );

        let load = self.source.load(None)?;
        let cleared = self.destination.clear()?;
        if cleared > 0 {
            info!("event=migrate module=reconcile status=cleared removed={cleared}");
        }

        let mut succeeded = 0;
        let mut failed = 0;
        let mut batches = 0;
        for (batch_index, batch) in load.records.chunks(batch_size).enumerate() {
            let outcome = self.destination.create_batch(batch)?;
            succeeded += outcome.created.len();
            failed += outcome.failures.len();
            batches += 1;

            for failure in &outcome.failures {
                warn!(
                    "event=migrate_insert module=reconcile status=error batch={} index={} error={}",
                    batch_index + 1,
                    failure.index,
                    failure.error
                );
            }
        }

        let destination_count = self.destination.count()?;
        let report = MigrationReport {
            total_parsed: load.records.len(),
            succeeded,
            failed,
            skipped: load.skipped,
            batches,
            destination_count,
            verified: destination_count == succeeded,
        };

        info!(
            "event=migrate module=reconcile status=ok duration_ms={} parsed={} succeeded={} failed={} skipped={} verified={}",
            started_at.elapsed().as_millis(),
            report.total_parsed,
            report.succeeded,
            report.failed,
            report.skipped.len(),
            report.verified
        );
        Ok(report)
    }

    /// Re-parses the source and re-counts the destination.
    pub fn verify(&self) -> RepoResult<bool> {
        let source_count = self.source.load(None)?.records.len();
        let destination_count = self.destination.count()?;
        let matches = source_count == destination_count;
        if matches {
            info!("event=migrate_verify module=reconcile status=ok records={source_count}");
        } else {
            warn!(
                "event=migrate_verify module=reconcile status=mismatch source={} destination={}",
                source_count, destination_count
            );
        }
        Ok(matches)
    }

    pub fn statistics(&self) -> RepoResult<MigrationStatistics> {
        let source_record_count = self.source.load(None)?.records.len();
        let destination_record_count = self.destination.count()?;

        let mut regions = BTreeSet::new();
        let mut stations = BTreeSet::new();
        for stored in self.destination.read_all(&ListQuery::default())? {
            regions.insert(stored.record.region().to_string());
            stations.insert(stored.record.station_name().to_string());
        }

        Ok(MigrationStatistics {
            source_record_count,
            destination_record_count,
            unique_regions: regions.len(),
            unique_stations: stations.len(),
            regions: regions.into_iter().collect(),
            stations: stations.into_iter().collect(),
            counts_match: source_record_count == destination_record_count,
        })
    }
}
