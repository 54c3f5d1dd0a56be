//! Daygraph - dated CSV consolidation and interactive charting
//!
//! Discover daily log files on a file share, consolidate them into one
//! time-ordered dataset, and render a self-contained interactive chart
//! where picking a date (or date range) and a variable always shows
//! exactly one trace.
//!
//! # Pipeline
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`discovery`] | Find files named `*_YYYYMMDD.csv`, ascending by date |
//! | [`loader`] | Load each file into a row-capped table, tolerating per-file failures |
//! | [`normalize`] | Attach an ascending timestamp column, synthesizing one when absent |
//! | [`consolidate`] | Pick the numeric variables and shape the data per mode |
//! | [`trace`] | Emit chart traces, exactly one visible |
//! | [`render`] | Write the HTML artifact with the embedded selector script |
//!
//! # Quick Start
//!
//! ```no_run
//! use daygraph::config::Config;
//! use daygraph::consolidate::ConsolidationMode;
//! use daygraph::share::LocalShare;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let share = LocalShare::new("/mnt/nas");
//!
//! let summary = daygraph::pipeline::run(
//!     &share,
//!     &config,
//!     ConsolidationMode::Range,
//!     Path::new("daygraph.html"),
//!     false,
//! ).unwrap();
//!
//! println!("{} dates, {} traces", summary.dates, summary.traces);
//! ```

pub mod config;
pub mod consolidate;
pub mod discovery;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod selector;
pub mod serve;
pub mod share;
pub mod trace;

pub use config::{Config, SchemaPolicy, SkipPolicy};
pub use consolidate::{Consolidated, Consolidation, ConsolidationMode, SchemaMismatch};
pub use discovery::DatedFile;
pub use loader::{LoadOutcome, LoadedTable};
pub use normalize::{NormalizedTable, TimestampOrigin};
pub use pipeline::{PipelineError, PipelineSummary};
pub use render::ChartDocument;
pub use selector::{Control, Effects, SelectorState};
pub use share::{FileShare, LocalShare, RawTable, ShareError};
pub use trace::{Trace, TraceLayout};
