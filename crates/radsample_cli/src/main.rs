//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one file-to-SQLite migration from a TOML config (default `radsample.toml`).
//! - Print deterministic summary lines for quick local sanity checks.

use radsample_core::db::open_db;
use radsample_core::{
    core_version, init_from_config, load_config, FileStore, Migrator, SqliteSampleRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CONFIG_FILE: &str = "radsample.toml";

fn main() -> ExitCode {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match run(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("radsample error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: PathBuf) -> Result<(), Box<dyn Error>> {
    let config = load_config(&config_path)?;
    init_from_config(&config.logging)?;
    println!("radsample_core version={}", core_version());

    let source = FileStore::from_config(&config.data);
    let conn = open_db(&config.database.path)?;
    let repo = SqliteSampleRepository::try_new(&conn)?;
    let mut migrator = Migrator::new(&source, repo);

    let report = migrator.migrate(config.migration.batch_size)?;
    let (total, succeeded, failed) = report.totals();
    println!(
        "migrate total={total} succeeded={succeeded} failed={failed} skipped={}",
        report.skipped.len()
    );
    println!("verify ok={}", migrator.verify()?);
    Ok(())
}
