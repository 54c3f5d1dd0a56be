//! Per-date dataset loading
//!
//! Loads every discovered file into a row-capped table on the rayon
//! worker pool. One date's failure never aborts the others: successes
//! and failures are collected separately, and the survivors are re-sorted
//! by date so downstream ordering never depends on completion order.

use crate::config::SkipPolicy;
use crate::discovery::DatedFile;
use crate::share::{FileShare, RawTable, ShareError};
use colored::Colorize;
use rayon::prelude::*;

/// A successfully loaded date
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub file: DatedFile,
    pub table: RawTable,
}

/// A date that failed to load and was excluded
#[derive(Debug)]
pub struct LoadFailure {
    pub file: DatedFile,
    pub error: ShareError,
}

/// Aggregated result of loading all discovered files
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Ascending by date regardless of completion order
    pub loaded: Vec<LoadedTable>,
    pub failed: Vec<LoadFailure>,
}

/// Load every file, recovering from per-file failures.
///
/// Failures are logged with the offending date key (unless the skip
/// policy is silent) and reported back in the outcome; deciding whether
/// zero successes is fatal is the caller's job.
pub fn load_all(
    share: &dyn FileShare,
    files: &[DatedFile],
    row_cap: usize,
    skip_policy: SkipPolicy,
) -> LoadOutcome {
    let results: Vec<(DatedFile, Result<RawTable, ShareError>)> = files
        .par_iter()
        .map(|f| (f.clone(), share.load_table(&f.path, row_cap)))
        .collect();

    let mut outcome = LoadOutcome::default();
    for (file, result) in results {
        match result {
            Ok(table) => outcome.loaded.push(LoadedTable { file, table }),
            Err(error) => {
                if skip_policy == SkipPolicy::Warn {
                    eprintln!(
                        "{} {}: {}",
                        "warning:".yellow().bold(),
                        file.date_key,
                        error
                    );
                }
                outcome.failed.push(LoadFailure { file, error });
            }
        }
    }

    outcome.loaded.sort_by_key(|l| l.file.date);
    outcome.failed.sort_by_key(|f| f.file.date);
    outcome
}
