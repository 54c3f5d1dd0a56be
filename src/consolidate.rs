//! Consolidation of per-date tables
//!
//! Decides which numeric columns become selectable variables and shapes
//! the normalized tables for the chosen mode: per-date keeps each date as
//! an independent series, range merges everything into one ascending
//! timeline. The variable list is fixed once, from the first surviving
//! table, and every other table must carry the same columns.

use crate::config::{SchemaPolicy, SkipPolicy};
use crate::discovery::DatedFile;
use crate::normalize::{NormalizedTable, TIMESTAMP_COLUMN};
use chrono::NaiveDateTime;
use colored::Colorize;

/// The two consolidation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConsolidationMode {
    /// One independent series per date, single date selector
    PerDate,
    /// One merged timeline, filterable by a start/end date window
    Range,
}

impl ConsolidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationMode::PerDate => "per-date",
            ConsolidationMode::Range => "range",
        }
    }
}

impl std::fmt::Display for ConsolidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table missing a column the variable list expects
#[derive(Debug)]
pub struct SchemaMismatch {
    pub date_key: String,
    pub column: String,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "table for {} is missing expected column '{}'",
            self.date_key, self.column
        )
    }
}

impl std::error::Error for SchemaMismatch {}

/// Range mode's merged table
#[derive(Debug, Clone)]
pub struct ConsolidatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Globally non-decreasing
    pub timestamps: Vec<NaiveDateTime>,
}

impl ConsolidatedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mode-shaped data ready for trace building
#[derive(Debug)]
pub enum Consolidated {
    PerDate { tables: Vec<NormalizedTable> },
    Range { table: ConsolidatedTable },
}

/// Consolidation result: the ordered variables, the dates that survived,
/// and the mode-shaped data
#[derive(Debug)]
pub struct Consolidation {
    pub mode: ConsolidationMode,
    pub variables: Vec<String>,
    pub dates: Vec<DatedFile>,
    pub data: Consolidated,
}

/// Consolidate normalized tables under the chosen mode.
///
/// `tables` must be non-empty and ascending by date (the loader
/// guarantees both). Returns Err only under the abort schema policy;
/// under exclude, mismatching dates are dropped with a warning.
pub fn consolidate(
    tables: Vec<NormalizedTable>,
    mode: ConsolidationMode,
    priority: &str,
    schema_policy: SchemaPolicy,
    skip_policy: SkipPolicy,
) -> Result<Consolidation, SchemaMismatch> {
    let variables = detect_variables(&tables[0], priority);

    let mut surviving = Vec::with_capacity(tables.len());
    for table in tables {
        match check_schema(&table, &variables) {
            Ok(()) => surviving.push(table),
            Err(mismatch) => match schema_policy {
                SchemaPolicy::Abort => return Err(mismatch),
                SchemaPolicy::Exclude => {
                    if skip_policy == SkipPolicy::Warn {
                        eprintln!("{} {}, excluding", "warning:".yellow().bold(), mismatch);
                    }
                }
            },
        }
    }

    let dates: Vec<DatedFile> = surviving.iter().map(|t| t.file.clone()).collect();

    let data = match mode {
        ConsolidationMode::PerDate => Consolidated::PerDate { tables: surviving },
        ConsolidationMode::Range => Consolidated::Range {
            table: merge(surviving),
        },
    };

    Ok(Consolidation {
        mode,
        variables,
        dates,
        data,
    })
}

/// Numeric columns of one table, priority column pinned to index 0.
///
/// A column is numeric when every non-empty cell parses as a float; the
/// timestamp column never counts. Remaining columns keep their original
/// relative order.
pub fn detect_variables(table: &NormalizedTable, priority: &str) -> Vec<String> {
    let mut variables: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != TIMESTAMP_COLUMN)
        .filter(|(idx, _)| {
            table.rows.iter().all(|row| {
                row.get(*idx)
                    .map(|cell| cell.is_empty() || cell.parse::<f64>().is_ok())
                    .unwrap_or(false)
            })
        })
        .map(|(_, name)| name.clone())
        .collect();

    if let Some(pos) = variables.iter().position(|v| v == priority) {
        let pinned = variables.remove(pos);
        variables.insert(0, pinned);
    }

    variables
}

fn check_schema(table: &NormalizedTable, variables: &[String]) -> Result<(), SchemaMismatch> {
    for variable in variables {
        if !table.columns.iter().any(|c| c == variable) {
            return Err(SchemaMismatch {
                date_key: table.file.date_key.clone(),
                column: variable.clone(),
            });
        }
    }
    Ok(())
}

/// Concatenate tables then re-sort ascending by timestamp.
///
/// The sort is stable, so rows sharing an instant keep date order.
fn merge(tables: Vec<NormalizedTable>) -> ConsolidatedTable {
    let columns = tables
        .first()
        .map(|t| t.columns.clone())
        .unwrap_or_default();

    let mut keyed: Vec<(NaiveDateTime, Vec<String>)> = Vec::new();
    for table in tables {
        // Column order can differ between files even when names agree
        let remap: Option<Vec<Option<usize>>> = if table.columns == columns {
            None
        } else {
            Some(
                columns
                    .iter()
                    .map(|c| table.columns.iter().position(|s| s == c))
                    .collect(),
            )
        };

        for (ts, row) in table.timestamps.into_iter().zip(table.rows) {
            let row = match &remap {
                None => row,
                Some(map) => map
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect(),
            };
            keyed.push((ts, row));
        }
    }
    keyed.sort_by_key(|(ts, _)| *ts);

    let (timestamps, rows) = keyed.into_iter().unzip();
    ConsolidatedTable {
        columns,
        rows,
        timestamps,
    }
}
