//! Append-only record of completed operations, plus output-name derivation.
//!
//! The codec never reads the log back. Front ends hand a [`HistoryEntry`] to
//! whatever [`History`] they were given after each successful call.

use core::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::container::COMPRESSED_EXTENSION;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Compressed,
    Decompressed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Compressed => "compressed",
            Operation::Decompressed => "decompressed",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub operation: Operation,
    pub original: PathBuf,
    pub output: PathBuf,
    /// Extension tag of the original file, empty when it had none.
    pub file_type: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn now(operation: Operation, original: impl Into<PathBuf>, output: impl Into<PathBuf>, file_type: impl Into<String>) -> Self {
        Self {
            operation,
            original: original.into(),
            output: output.into(),
            file_type: file_type.into(),
            timestamp: Local::now(),
        }
    }
}

/// One log line, without the trailing newline.
impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_type = if self.file_type.is_empty() { "none" } else { &self.file_type };
        write!(
            f,
            "[{}] {} {} -> {} (type: {})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.original.display(),
            self.output.display(),
            file_type
        )
    }
}

pub trait History {
    fn record(&mut self, entry: &HistoryEntry) -> io::Result<()>;
}

/// Appends one line per entry to a text file, creating it on first use.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl History for HistoryLog {
    fn record(&mut self, entry: &HistoryEntry) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{entry}")
    }
}

/// Keeps entries in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryHistory {
    pub entries: Vec<HistoryEntry>,
}

impl History for MemoryHistory {
    fn record(&mut self, entry: &HistoryEntry) -> io::Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHistory;

impl History for NoHistory {
    fn record(&mut self, _entry: &HistoryEntry) -> io::Result<()> {
        Ok(())
    }
}

/// `dir/name.ext` -> `dir/name.<extension>`.
pub fn compressed_name(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}

/// [`compressed_name`] with the default `huf` extension.
pub fn default_compressed_name(source: &Path) -> PathBuf {
    compressed_name(source, COMPRESSED_EXTENSION)
}

/// `dir/name.huf` with tag `ext` -> `dir/name.ext`; an empty tag drops the extension.
pub fn restored_name(container: &Path, extension_tag: &str) -> PathBuf {
    container.with_extension(extension_tag)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_entry() -> HistoryEntry {
        HistoryEntry {
            operation: Operation::Compressed,
            original: PathBuf::from("docs/report.txt"),
            output: PathBuf::from("docs/report.huf"),
            file_type: "txt".into(),
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[test]
    fn entry_line_format() {
        assert_eq!(
            fixed_entry().to_string(),
            format!(
                "[2024-03-09 14:05:07] compressed {} -> {} (type: txt)",
                Path::new("docs/report.txt").display(),
                Path::new("docs/report.huf").display()
            )
        );
    }

    #[test]
    fn missing_type_is_shown_as_none() {
        let mut entry = fixed_entry();
        entry.file_type.clear();
        assert!(entry.to_string().ends_with("(type: none)"));
    }

    #[test]
    fn log_appends_lines() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut log = HistoryLog::new(dir.path().join("history.log"));

        let first = fixed_entry();
        let mut second = fixed_entry();
        second.operation = Operation::Decompressed;
        log.record(&first)?;
        log.record(&second)?;

        let text = std::fs::read_to_string(log.path())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![first.to_string(), second.to_string()]);
        assert!(lines[1].contains("decompressed"));
        Ok(())
    }

    #[test]
    fn memory_history_keeps_entries() {
        let mut history = MemoryHistory::default();
        history.record(&fixed_entry()).unwrap();
        assert_eq!(history.entries, vec![fixed_entry()]);
    }

    #[test]
    fn output_names() {
        assert_eq!(default_compressed_name(Path::new("a/b/notes.txt")), PathBuf::from("a/b/notes.huf"));
        assert_eq!(default_compressed_name(Path::new("Makefile")), PathBuf::from("Makefile.huf"));
        assert_eq!(compressed_name(Path::new("x.tar"), "hz"), PathBuf::from("x.hz"));
        assert_eq!(restored_name(Path::new("a/b/notes.huf"), "txt"), PathBuf::from("a/b/notes.txt"));
        assert_eq!(restored_name(Path::new("Makefile.huf"), ""), PathBuf::from("Makefile"));
    }
}
