//! Trace construction
//!
//! Pure transformation from consolidated data to chart traces: one trace
//! per (date, variable) pair in per-date mode, one per variable in range
//! mode, all hidden except trace 0. `TraceLayout` owns the (date,
//! variable) to trace-id arithmetic so no other code re-derives it.

use crate::consolidate::{Consolidated, Consolidation};
use chrono::NaiveDateTime;
use serde::Serialize;

/// One renderable series
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_key: Option<String>,
    pub variable: String,
    /// Legend label
    pub name: String,
    /// Hover template, chart-engine syntax
    pub hover: String,
    pub visible: bool,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

/// Array-backed bidirectional map between (date index, variable index)
/// and trace id
#[derive(Debug, Clone)]
pub struct TraceLayout {
    ids: Vec<Vec<usize>>,
    positions: Vec<(usize, usize)>,
}

impl TraceLayout {
    /// Per-date layout: one trace per (date, variable) pair
    pub fn per_date(date_count: usize, variable_count: usize) -> Self {
        let mut ids = Vec::with_capacity(date_count);
        let mut positions = Vec::with_capacity(date_count * variable_count);
        for date_idx in 0..date_count {
            let mut row = Vec::with_capacity(variable_count);
            for var_idx in 0..variable_count {
                row.push(positions.len());
                positions.push((date_idx, var_idx));
            }
            ids.push(row);
        }
        Self { ids, positions }
    }

    /// Range layout: one trace per variable, the date dimension selects
    /// an axis window instead of a trace
    pub fn range(variable_count: usize) -> Self {
        Self::per_date(1, variable_count)
    }

    pub fn id(&self, date_idx: usize, var_idx: usize) -> usize {
        self.ids[date_idx][var_idx]
    }

    pub fn position(&self, id: usize) -> (usize, usize) {
        self.positions[id]
    }

    pub fn trace_count(&self) -> usize {
        self.positions.len()
    }

    pub fn date_count(&self) -> usize {
        self.ids.len()
    }

    pub fn variable_count(&self) -> usize {
        self.ids.first().map(Vec::len).unwrap_or(0)
    }

    /// The full (date, variable) -> id table, for embedding in the
    /// artifact payload
    pub fn id_table(&self) -> &[Vec<usize>] {
        &self.ids
    }
}

/// Build all traces for the consolidation, trace 0 visible.
pub fn build_traces(consolidation: &Consolidation) -> (Vec<Trace>, TraceLayout) {
    let variables = &consolidation.variables;

    let (mut traces, layout) = match &consolidation.data {
        Consolidated::PerDate { tables } => {
            let layout = TraceLayout::per_date(tables.len(), variables.len());
            let mut traces = Vec::with_capacity(layout.trace_count());
            for table in tables {
                let x = format_timestamps(&table.timestamps);
                for variable in variables {
                    let date_key = &table.file.date_key;
                    traces.push(Trace {
                        id: traces.len(),
                        date_key: Some(date_key.clone()),
                        variable: variable.clone(),
                        name: format!("{} - {}", date_key, variable),
                        hover: hover_template(&format!("{} - {}", date_key, variable)),
                        visible: false,
                        x: x.clone(),
                        y: column_series(&table.columns, &table.rows, variable),
                    });
                }
            }
            (traces, layout)
        }
        Consolidated::Range { table } => {
            let layout = TraceLayout::range(variables.len());
            let x = format_timestamps(&table.timestamps);
            let mut traces = Vec::with_capacity(variables.len());
            for variable in variables {
                traces.push(Trace {
                    id: traces.len(),
                    date_key: None,
                    variable: variable.clone(),
                    name: variable.clone(),
                    hover: hover_template(variable),
                    visible: false,
                    x: x.clone(),
                    y: column_series(&table.columns, &table.rows, variable),
                });
            }
            (traces, layout)
        }
    };

    if let Some(first) = traces.first_mut() {
        first.visible = true;
    }

    (traces, layout)
}

fn hover_template(label: &str) -> String {
    format!(
        "<b>{}</b><br>Time: %{{x}}<br>Value: %{{y:.2f}}<extra></extra>",
        label
    )
}

fn format_timestamps(timestamps: &[NaiveDateTime]) -> Vec<String> {
    timestamps
        .iter()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect()
}

fn column_series(columns: &[String], rows: &[Vec<String>], variable: &str) -> Vec<Option<f64>> {
    let idx = columns.iter().position(|c| c == variable);
    rows.iter()
        .map(|row| {
            idx.and_then(|i| row.get(i))
                .and_then(|cell| cell.parse::<f64>().ok())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchemaPolicy, SkipPolicy};
    use crate::consolidate::{consolidate, ConsolidationMode};
    use crate::discovery::DatedFile;
    use crate::normalize::NormalizedTable;
    use chrono::NaiveDate;

    fn sample_table(date_key: &str, y: i32, m: u32, d: u32, rows: usize) -> NormalizedTable {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let base = date.and_hms_opt(0, 0, 0).unwrap();
        NormalizedTable {
            file: DatedFile {
                path: format!("x_{}.csv", date_key),
                date_key: date_key.to_string(),
                date,
            },
            columns: vec!["Power".to_string(), "Temp".to_string()],
            rows: (0..rows)
                .map(|i| vec![format!("{}.5", i), format!("{}", 20 + i)])
                .collect(),
            timestamps: (0..rows)
                .map(|i| base + chrono::Duration::seconds(i as i64))
                .collect(),
        }
    }

    fn per_date_consolidation(dates: usize) -> Consolidation {
        let tables = (0..dates)
            .map(|i| {
                sample_table(
                    &format!("2025010{}", i + 1),
                    2025,
                    1,
                    i as u32 + 1,
                    3,
                )
            })
            .collect();
        consolidate(
            tables,
            ConsolidationMode::PerDate,
            "Power",
            SchemaPolicy::Exclude,
            SkipPolicy::Silent,
        )
        .unwrap()
    }

    #[test]
    fn test_per_date_emits_dates_times_variables() {
        let (traces, layout) = build_traces(&per_date_consolidation(2));

        assert_eq!(traces.len(), 2 * 2);
        assert_eq!(layout.trace_count(), 4);
        assert!(traces[0].visible);
        assert!(traces[1..].iter().all(|t| !t.visible));
    }

    #[test]
    fn test_layout_is_bidirectional() {
        let layout = TraceLayout::per_date(3, 4);

        for id in 0..layout.trace_count() {
            let (d, v) = layout.position(id);
            assert_eq!(layout.id(d, v), id);
        }
        assert_eq!(layout.id(2, 3), 11);
        assert_eq!(layout.position(5), (1, 1));
    }

    #[test]
    fn test_range_emits_one_trace_per_variable() {
        let tables = vec![
            sample_table("20250101", 2025, 1, 1, 2),
            sample_table("20250103", 2025, 1, 3, 3),
        ];
        let consolidation = consolidate(
            tables,
            ConsolidationMode::Range,
            "Power",
            SchemaPolicy::Exclude,
            SkipPolicy::Silent,
        )
        .unwrap();

        let (traces, layout) = build_traces(&consolidation);

        assert_eq!(traces.len(), 2);
        assert_eq!(layout.variable_count(), 2);
        assert!(traces[0].date_key.is_none());
        // Whole consolidated series on every trace
        assert_eq!(traces[0].x.len(), 5);
        assert!(traces[0].visible);
        assert!(!traces[1].visible);
    }

    #[test]
    fn test_trace_labels_and_hover() {
        let (traces, _) = build_traces(&per_date_consolidation(1));

        assert_eq!(traces[0].name, "20250101 - Power");
        assert!(traces[0].hover.contains("<b>20250101 - Power</b>"));
        assert!(traces[0].hover.contains("%{y:.2f}"));
    }

    #[test]
    fn test_unparseable_cells_become_gaps() {
        let mut table = sample_table("20250101", 2025, 1, 1, 2);
        table.rows[1][0] = String::new();
        let consolidation = consolidate(
            vec![table],
            ConsolidationMode::PerDate,
            "Power",
            SchemaPolicy::Exclude,
            SkipPolicy::Silent,
        )
        .unwrap();

        let (traces, _) = build_traces(&consolidation);

        assert_eq!(traces[0].y[0], Some(0.5));
        assert_eq!(traces[0].y[1], None);
    }
}
