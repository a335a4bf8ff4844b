//! Append-only round log.
//!
//! One tab-separated line per round: a lexicographically sortable
//! timestamp followed by one count per category, in lexicon order. The
//! format is stable so downstream alerting can tail the file.

use crate::Result;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp layout of the round log (sorts lexicographically).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%H:%M:%S";

/// Append-only sink for round results.
///
/// Opening the sink is the one fatal resource acquisition of the process;
/// individual write failures are surfaced to the caller, which logs and
/// carries on.
#[derive(Debug)]
pub struct RoundLog {
    file: File,
    path: PathBuf,
}

impl RoundLog {
    /// Opens (creating if needed) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the file cannot be
    /// opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| crate::Error::operation("open_round_log", e))?;
        Ok(Self { file, path })
    }

    /// Appends one round line: `timestamp \t c1 \t c2 ... \t ck`.
    ///
    /// A round with zero items still writes a line with all-zero fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] on write failure; the
    /// sink remains usable for subsequent rounds.
    pub fn append(&mut self, timestamp: DateTime<Local>, counts: &[u64]) -> Result<()> {
        let mut line = timestamp.format(TIMESTAMP_FORMAT).to_string();
        for count in counts {
            line.push('\t');
            line.push_str(&count.to_string());
        }
        line.push('\n');

        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| crate::Error::operation("append_round_log", e))
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_append_writes_tab_separated_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.dat");
        let mut log = RoundLog::open(&path).unwrap();

        log.append(fixed_timestamp(), &[1, 2, 0]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2024-03-05:12:30:45\t1\t2\t0\n");
    }

    #[test]
    fn test_append_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.dat");

        {
            let mut log = RoundLog::open(&path).unwrap();
            log.append(fixed_timestamp(), &[5]).unwrap();
        }
        // Reopen; the earlier line must survive.
        let mut log = RoundLog::open(&path).unwrap();
        log.append(fixed_timestamp(), &[7]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\t5"));
        assert!(lines[1].ends_with("\t7"));
    }

    #[test]
    fn test_zero_round_still_writes_all_zero_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.dat");
        let mut log = RoundLog::open(&path).unwrap();

        log.append(fixed_timestamp(), &[0, 0]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2024-03-05:12:30:45\t0\t0\n");
    }

    #[test]
    fn test_open_failure_is_fatal_error() {
        let result = RoundLog::open("/nonexistent-dir/sub/rounds.dat");
        assert!(matches!(
            result,
            Err(crate::Error::OperationFailed { .. })
        ));
    }
}
