//! Per-batch run log.
//!
//! The run log is a domain artifact kept next to the output tables: one
//! `"<timestamp> - <message>"` line per event. It is separate from the
//! process logger and is handed to the batch runner explicitly.

use chrono::{Local, NaiveDateTime};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExocatError, ExocatResult};
use crate::io::writer::TIMESTAMP_FORMAT;

/// Layout of the timestamp prefixing each line.
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Append-only event log of a batch run.
pub trait RunLog {
    /// Append one event line.
    fn record(&mut self, message: &str) -> ExocatResult<()>;

    /// Flush and release the log. Later `record` calls fail.
    fn close(&mut self) -> ExocatResult<()>;
}

/// `apt_parsing_log_<dd_mm_YYYY_HH_MM_SS>.txt`
pub fn run_log_file_name(timestamp: &NaiveDateTime) -> String {
    format!("apt_parsing_log_{}.txt", timestamp.format(TIMESTAMP_FORMAT))
}

fn format_line(message: &str) -> String {
    let now = Local::now();
    format!("{} - {}", now.format(LINE_TIMESTAMP_FORMAT), message)
}

/// Run log written to a file.
pub struct FileRunLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileRunLog {
    /// Create `dir` if needed and open a new log file named after `started`.
    pub fn open(dir: &Path, started: &NaiveDateTime) -> ExocatResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(run_log_file_name(started));
        let file = File::create(&path)?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl RunLog for FileRunLog {
    fn record(&mut self, message: &str) -> ExocatResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            ExocatError::Configuration(format!("Run log {} is closed", self.path.display()))
        })?;
        writeln!(writer, "{}", format_line(message))?;
        Ok(())
    }

    fn close(&mut self) -> ExocatResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileRunLog {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Run log kept in memory.
#[derive(Debug, Default)]
pub struct MemoryRunLog {
    lines: Vec<String>,
    closed: bool,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded messages without their timestamps.
    pub fn messages(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| line.split_once(" - ").map(|(_, msg)| msg))
            .collect()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RunLog for MemoryRunLog {
    fn record(&mut self, message: &str) -> ExocatResult<()> {
        if self.closed {
            return Err(ExocatError::Configuration("Run log is closed".to_string()));
        }
        self.lines.push(format_line(message));
        Ok(())
    }

    fn close(&mut self) -> ExocatResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 42)
            .unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            run_log_file_name(&started()),
            "apt_parsing_log_07_03_2024_09_05_42.txt"
        );
    }

    #[test]
    fn test_file_run_log_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut log = FileRunLog::open(&dir.path().join("logs"), &started()).unwrap();
        assert!(log.is_open());

        log.record("15469").unwrap();
        log.record("Time elapsed for download 0:00:01").unwrap();
        log.close().unwrap();
        assert!(!log.is_open());
        assert!(log.record("late").is_err());

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - 15469"));
        assert!(lines[1].contains(" - Time elapsed for download"));
    }

    #[test]
    fn test_memory_run_log() {
        let mut log = MemoryRunLog::new();
        log.record("13021").unwrap();
        log.record("Skipped: not an exoplanet program").unwrap();
        assert_eq!(
            log.messages(),
            vec!["13021", "Skipped: not an exoplanet program"]
        );

        log.close().unwrap();
        assert!(log.is_closed());
        assert!(log.record("late").is_err());
    }
}
