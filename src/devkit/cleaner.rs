// src/devkit/cleaner.rs

//! Removal of the artifacts an analysis marked as invalid

use super::knife::RepoKnife;
use crate::error::Result;
use tracing::{error, info};

/// Outcome of a cleaner run
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Every removal candidate, in analysis order
    pub candidates: Vec<String>,
    /// Candidates actually removed (empty on dry runs)
    pub removed: Vec<String>,
    /// Candidates whose removal failed, with the error
    pub failed: Vec<(String, String)>,
}

impl CleanReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct RepoCleaner<'a> {
    knife: &'a RepoKnife,
    dry_run: bool,
}

impl<'a> RepoCleaner<'a> {
    pub fn new(knife: &'a RepoKnife, dry_run: bool) -> Self {
        Self { knife, dry_run }
    }

    /// Analyze the store and remove (or list, on dry runs) every candidate
    ///
    /// A failed removal is logged and the remaining candidates are still
    /// processed.
    pub fn run(&self) -> Result<CleanReport> {
        let analysis = self.knife.analyze()?;
        let mut report = CleanReport {
            candidates: analysis.to_remove.clone(),
            ..Default::default()
        };

        for key in &analysis.to_remove {
            if self.dry_run {
                info!("[{}] Could be removed.", key);
                continue;
            }

            match self.knife.backend().remove(key) {
                Ok(()) => {
                    info!("[{}] Removed.", key);
                    report.removed.push(key.clone());
                }
                Err(e) => {
                    error!("[{}] Error on removing file: {}", key, e);
                    report.failed.push((key.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
