//! Dated-file discovery
//!
//! Filters a share listing down to files whose name ends in an 8-digit
//! calendar date (`*_YYYYMMDD.csv`) and orders them by that date. Files
//! whose token does not parse as a real date are excluded the same way
//! non-matching names are; the skip policy decides whether each exclusion
//! is logged.

use crate::config::SkipPolicy;
use crate::share::{FileShare, ShareError};
use chrono::NaiveDate;
use colored::Colorize;
use regex::Regex;

/// A source file whose name encodes its calendar date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedFile {
    /// Path as reported by the share listing
    pub path: String,
    /// The raw 8-digit token, used as the partition key and display label
    pub date_key: String,
    /// The token parsed as a date
    pub date: NaiveDate,
}

/// List `folder` on the share and keep the dated CSV files, ascending by
/// date. A failing listing call propagates; everything else is filtering.
pub fn discover(
    share: &dyn FileShare,
    folder: &str,
    skip_policy: SkipPolicy,
) -> Result<Vec<DatedFile>, ShareError> {
    let names = share.list_files(folder)?;
    Ok(filter_dated(names, skip_policy))
}

/// Filter a listing down to dated files, sorted ascending by date.
///
/// Two files carrying the same date token collapse to the last one seen
/// in the listing.
pub fn filter_dated(names: Vec<String>, skip_policy: SkipPolicy) -> Vec<DatedFile> {
    let date_re = Regex::new(r"(\d{8})\.csv$").unwrap();
    let mut dated: Vec<DatedFile> = Vec::new();

    for name in names {
        let token = match date_re.captures(&name) {
            Some(caps) => caps.get(1).unwrap().as_str().to_string(),
            None => continue,
        };

        let Some(date) = parse_date_key(&token) else {
            if skip_policy == SkipPolicy::Warn {
                eprintln!(
                    "{} {} has a date-shaped suffix that is not a date, skipping",
                    "warning:".yellow().bold(),
                    name
                );
            }
            continue;
        };

        if let Some(existing) = dated.iter_mut().find(|d| d.date_key == token) {
            if skip_policy == SkipPolicy::Warn {
                eprintln!(
                    "{} {} and {} both map to {}, keeping the latter",
                    "warning:".yellow().bold(),
                    existing.path,
                    name,
                    token
                );
            }
            existing.path = name;
            continue;
        }

        dated.push(DatedFile {
            path: name,
            date_key: token,
            date,
        });
    }

    dated.sort_by_key(|d| d.date);
    dated
}

/// Parse an 8-digit `YYYYMMDD` token into a date
pub fn parse_date_key(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_only_dated_csvs() {
        let dated = filter_dated(
            names(&[
                "a_20250101.csv",
                "c_notadate.csv",
                "readme.txt",
                "b_20250103.csv",
            ]),
            SkipPolicy::Silent,
        );

        let paths: Vec<&str> = dated.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["a_20250101.csv", "b_20250103.csv"]);
    }

    #[test]
    fn test_filter_sorts_ascending_by_date() {
        let dated = filter_dated(
            names(&["x_20250301.csv", "x_20240101.csv", "x_20241231.csv"]),
            SkipPolicy::Silent,
        );

        let keys: Vec<&str> = dated.iter().map(|d| d.date_key.as_str()).collect();
        assert_eq!(keys, vec!["20240101", "20241231", "20250301"]);
    }

    #[test]
    fn test_filter_excludes_impossible_dates() {
        // 20251301 matches the 8-digit pattern but month 13 does not parse
        let dated = filter_dated(
            names(&["x_20251301.csv", "x_20250101.csv"]),
            SkipPolicy::Silent,
        );

        assert_eq!(dated.len(), 1);
        assert_eq!(dated[0].date_key, "20250101");
    }

    #[test]
    fn test_duplicate_date_key_last_wins() {
        let dated = filter_dated(
            names(&["a_20250101.csv", "b_20250101.csv"]),
            SkipPolicy::Silent,
        );

        assert_eq!(dated.len(), 1);
        assert_eq!(dated[0].path, "b_20250101.csv");
    }

    #[test]
    fn test_parse_date_key() {
        assert_eq!(
            parse_date_key("20250101"),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(parse_date_key("20250230"), None); // Feb 30
        assert_eq!(parse_date_key("nonsense"), None);
    }

    #[test]
    fn test_discovery_error_propagates() {
        use crate::share::LocalShare;
        let dir = tempfile::TempDir::new().unwrap();
        let share = LocalShare::new(dir.path());

        assert!(discover(&share, "missing-folder", SkipPolicy::Silent).is_err());
    }
}
