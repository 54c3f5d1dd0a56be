//! Timestamp normalization
//!
//! Every table leaves this module with an ascending timestamp column.
//! Sources that carry their own `Timestamp` column get it parsed, with
//! unparseable rows dropped; sources without one get a synthesized
//! 1-second cadence whose starting instant depends on the consolidation
//! mode the caller is about to run.

use crate::discovery::DatedFile;
use crate::share::RawTable;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Column name recognized as the source timestamp
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Formats accepted for source timestamps, tried in order
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%d%H%M%S",
];

/// Where a synthesized timeline starts.
///
/// The two origins are not interchangeable: per-date mode wants every
/// date on the same axis span, range mode wants each file anchored to
/// its own day. The consolidator threads its choice through explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampOrigin {
    /// A fixed epoch shared by every file (per-date mode)
    FixedEpoch,
    /// Midnight of the file's own calendar date (range mode)
    FileDate,
}

/// A table with its mandatory ascending timeline
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub file: DatedFile,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// One instant per row, non-decreasing
    pub timestamps: Vec<NaiveDateTime>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The epoch used when synthesizing timelines in per-date mode
pub fn fixed_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Attach an ascending timeline to a loaded table.
///
/// With a `Timestamp` column: parse, drop rows that fail, sort ascending.
/// Without one: synthesize 1-second cadence from the origin's start
/// instant. Either way the output satisfies the ascending invariant the
/// consolidator depends on.
pub fn normalize(file: DatedFile, table: RawTable, origin: TimestampOrigin) -> NormalizedTable {
    match table.column_index(TIMESTAMP_COLUMN) {
        Some(ts_idx) => {
            let mut keyed: Vec<(NaiveDateTime, Vec<String>)> = table
                .rows
                .into_iter()
                .filter_map(|row| {
                    let ts = row.get(ts_idx).and_then(|s| parse_timestamp(s))?;
                    Some((ts, row))
                })
                .collect();
            keyed.sort_by_key(|(ts, _)| *ts);

            let (timestamps, rows) = keyed.into_iter().unzip();
            NormalizedTable {
                file,
                columns: table.columns,
                rows,
                timestamps,
            }
        }
        None => {
            let start = match origin {
                TimestampOrigin::FixedEpoch => fixed_epoch(),
                TimestampOrigin::FileDate => file.date.and_hms_opt(0, 0, 0).unwrap(),
            };
            let timestamps = (0..table.rows.len())
                .map(|i| start + Duration::seconds(i as i64))
                .collect();
            NormalizedTable {
                file,
                columns: table.columns,
                rows: table.rows,
                timestamps,
            }
        }
    }
}

/// Parse one source timestamp cell
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    // A bare date is midnight of that date
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
