//! Pipeline orchestration
//!
//! Discovery, loading, normalization, consolidation, trace building,
//! artifact rendering, in that order. Fatal conditions get their own
//! error variants; per-file problems are recovered upstream and surface
//! here only as counts in the summary.

use crate::config::Config;
use crate::consolidate::{consolidate, ConsolidationMode, SchemaMismatch};
use crate::discovery;
use crate::loader;
use crate::normalize::{normalize, TimestampOrigin};
use crate::render::{self, ChartDocument};
use crate::share::{FileShare, ShareError};
use crate::trace::build_traces;
use colored::Colorize;
use std::path::Path;

/// Fatal pipeline errors. Anything recoverable (one bad file, one
/// mismatching date under the exclude policy) never reaches this type.
#[derive(Debug)]
pub enum PipelineError {
    /// Bad or missing configuration, raised before any discovery
    Config(String),
    /// The share listing call itself failed
    Discovery(ShareError),
    /// Every file failed to load, or every date was excluded
    NoData,
    /// No numeric columns to chart
    NoVariables,
    /// Schema mismatch under the abort policy
    Schema(SchemaMismatch),
    /// Could not write the artifact
    Render(std::io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Discovery(e) => write!(f, "Failed to list share folder: {}", e),
            PipelineError::NoData => write!(f, "No files loaded. Nothing to chart."),
            PipelineError::NoVariables => {
                write!(f, "No numeric columns detected in the loaded files.")
            }
            PipelineError::Schema(e) => write!(f, "Schema mismatch: {}", e),
            PipelineError::Render(e) => write!(f, "Failed to write artifact: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SchemaMismatch> for PipelineError {
    fn from(e: SchemaMismatch) -> Self {
        PipelineError::Schema(e)
    }
}

/// What a run did, for the status line and for tests
#[derive(Debug, Clone, Copy)]
pub struct PipelineSummary {
    pub discovered: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Dates surviving the schema check
    pub dates: usize,
    pub variables: usize,
    pub traces: usize,
    /// Total rows across surviving tables
    pub rows: usize,
}

/// Run the whole pipeline and write the artifact to `output`.
pub fn run(
    share: &dyn FileShare,
    config: &Config,
    mode: ConsolidationMode,
    output: &Path,
    quiet: bool,
) -> Result<PipelineSummary, PipelineError> {
    let skip = config.pipeline.skip_policy;
    let folder = &config.share.folder;

    let files =
        discovery::discover(share, folder, skip).map_err(PipelineError::Discovery)?;
    if !quiet {
        eprintln!("{} {} dated files", "Found".green().bold(), files.len());
        for file in files.iter().take(5) {
            eprintln!("  {} ({})", file.path, file.date_key);
        }
        if files.len() > 5 {
            eprintln!("  ...");
        }
    }

    let outcome = loader::load_all(share, &files, config.pipeline.row_cap, skip);
    if outcome.loaded.is_empty() {
        return Err(PipelineError::NoData);
    }
    if !quiet {
        for loaded in &outcome.loaded {
            eprintln!("  {}: {} rows", loaded.file.date_key, loaded.table.len());
        }
    }

    let origin = match mode {
        ConsolidationMode::PerDate => TimestampOrigin::FixedEpoch,
        ConsolidationMode::Range => TimestampOrigin::FileDate,
    };

    let discovered = files.len();
    let loaded_count = outcome.loaded.len();
    let failed_count = outcome.failed.len();

    let tables = outcome
        .loaded
        .into_iter()
        .map(|l| normalize(l.file, l.table, origin))
        .collect();

    let consolidation = consolidate(
        tables,
        mode,
        &config.pipeline.priority_variable,
        config.pipeline.schema_policy,
        skip,
    )?;
    if consolidation.dates.is_empty() {
        return Err(PipelineError::NoData);
    }
    if consolidation.variables.is_empty() {
        return Err(PipelineError::NoVariables);
    }

    let rows = match &consolidation.data {
        crate::consolidate::Consolidated::PerDate { tables } => {
            tables.iter().map(|t| t.len()).sum()
        }
        crate::consolidate::Consolidated::Range { table } => table.len(),
    };

    let (traces, layout) = build_traces(&consolidation);

    let summary = PipelineSummary {
        discovered,
        loaded: loaded_count,
        failed: failed_count,
        dates: consolidation.dates.len(),
        variables: consolidation.variables.len(),
        traces: traces.len(),
        rows,
    };

    let title_base = if folder.is_empty() {
        "Data Viewer".to_string()
    } else {
        format!("Data Viewer - {}", folder)
    };

    let doc = ChartDocument {
        mode,
        title_base,
        dates: consolidation.dates,
        variables: consolidation.variables,
        traces,
        layout,
    };
    render::render_to_file(output, &doc).map_err(PipelineError::Render)?;

    if !quiet {
        eprintln!(
            "{} {} ({} traces, {} dates, {} variables)",
            "Wrote".green().bold(),
            output.display(),
            summary.traces,
            summary.dates,
            summary.variables
        );
    }

    Ok(summary)
}
