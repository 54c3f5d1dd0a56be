//! File-share boundary
//!
//! The remote share is an external collaborator: daygraph only needs a
//! listing call and a row-capped table read. Everything else about the
//! share (authentication, connection pooling, raw byte transfer) stays
//! behind the `FileShare` trait. `LocalShare` implements the trait over a
//! plain directory and doubles as the template for wiring a real SMB or
//! NFS client.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// One CSV file read into memory: header plus raw string cells.
///
/// Cells stay as strings until the consolidator decides which columns are
/// numeric; a table never exceeds the row cap it was loaded with.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of a named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Error type for share operations
#[derive(Debug)]
pub enum ShareError {
    Io(std::io::Error),
    Csv(csv::Error),
    Transport(String),
}

impl std::fmt::Display for ShareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareError::Io(e) => write!(f, "IO error: {}", e),
            ShareError::Csv(e) => write!(f, "CSV error: {}", e),
            ShareError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ShareError {}

impl From<std::io::Error> for ShareError {
    fn from(e: std::io::Error) -> Self {
        ShareError::Io(e)
    }
}

impl From<csv::Error> for ShareError {
    fn from(e: csv::Error) -> Self {
        ShareError::Csv(e)
    }
}

/// A listing call and a row-capped table read.
///
/// Implementations must be shareable across the loader's worker pool,
/// hence the `Sync` bound.
pub trait FileShare: Sync {
    /// List file names directly under `folder` (no recursion)
    fn list_files(&self, folder: &str) -> Result<Vec<String>, ShareError>;

    /// Read a CSV file into a table, keeping at most `row_cap` rows from
    /// the start of the file
    fn load_table(&self, path: &str, row_cap: usize) -> Result<RawTable, ShareError>;
}

/// Directory-backed share implementation
pub struct LocalShare {
    root: PathBuf,
}

impl LocalShare {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl FileShare for LocalShare {
    fn list_files(&self, folder: &str) -> Result<Vec<String>, ShareError> {
        let dir = self.resolve(folder);
        let mut names = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if folder.is_empty() {
                    names.push(name.to_string());
                } else {
                    names.push(format!("{}/{}", folder.trim_end_matches('/'), name));
                }
            }
        }

        Ok(names)
    }

    fn load_table(&self, path: &str, row_cap: usize) -> Result<RawTable, ShareError> {
        let file = File::open(self.resolve(path))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            if rows.len() >= row_cap {
                break;
            }
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(RawTable { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        let mut f = File::create(dir.path().join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_list_files_flat() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.csv", "x\n1\n");
        write_file(&dir, "b.csv", "x\n2\n");
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let share = LocalShare::new(dir.path());
        let mut names = share.list_files("").unwrap();
        names.sort();

        // Directories are not files
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_list_files_missing_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        let share = LocalShare::new(dir.path());
        assert!(share.list_files("nope").is_err());
    }

    #[test]
    fn test_load_table_reads_header_and_rows() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "log.csv", "Timestamp,Power,Temp\n2025-01-01 00:00:00,1.5,20\n2025-01-01 00:00:01,1.6,21\n");

        let share = LocalShare::new(dir.path());
        let table = share.load_table("log.csv", 50_000).unwrap();

        assert_eq!(table.columns, vec!["Timestamp", "Power", "Temp"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][1], "1.6");
        assert_eq!(table.column_index("Temp"), Some(2));
        assert_eq!(table.column_index("Humidity"), None);
    }

    #[test]
    fn test_load_table_enforces_row_cap_from_start() {
        let dir = TempDir::new().unwrap();
        let mut contents = String::from("v\n");
        for i in 0..100 {
            contents.push_str(&format!("{}\n", i));
        }
        write_file(&dir, "big.csv", &contents);

        let share = LocalShare::new(dir.path());
        let table = share.load_table("big.csv", 50).unwrap();

        assert_eq!(table.len(), 50);
        assert_eq!(table.rows[0][0], "0");
        assert_eq!(table.rows[49][0], "49");
    }

    #[test]
    fn test_load_table_malformed_csv_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "bad.csv", "a,b\n1,2\n3\n");

        let share = LocalShare::new(dir.path());
        assert!(share.load_table("bad.csv", 50_000).is_err());
    }
}
