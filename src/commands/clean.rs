// src/commands/clean.rs
//! Store cleanup command

use super::open_knife;
use crate::cli::BackendArgs;
use anyhow::{Context, Result};
use repo_devkit::RepoCleaner;
use tracing::info;

/// Remove (or list, with `dry_run`) the files the analysis rejects
pub fn cmd_clean(
    trees: &[String],
    specs_file: Option<&str>,
    backend: &BackendArgs,
    dry_run: bool,
) -> Result<()> {
    let knife = open_knife(trees, specs_file, backend)?;

    info!("Analyzing store...");
    let report = RepoCleaner::new(&knife, dry_run)
        .run()
        .context("Store analysis failed")?;

    if dry_run {
        for key in &report.candidates {
            println!("{}", key);
        }
        println!("{} files could be removed", report.candidates.len());
    } else if report.is_success() {
        println!("Removed {} files", report.removed.len());
    } else {
        println!(
            "Removed {} files, {} removals failed",
            report.removed.len(),
            report.failed.len()
        );
    }

    Ok(())
}
