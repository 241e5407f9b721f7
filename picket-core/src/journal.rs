//! Per-run journal.
//!
//! Every apply/reset run appends timestamped, severity-tagged lines to a
//! log file under `<home>/.picket/logs/` and mirrors them to the console:
//!
//! ```text
//! [2026-08-22 14:03:55] [INFO] fetching refs/changes/35/850035/3
//! [2026-08-22 14:03:56] [SUCCESS] applied 850035/3
//! ```
//!
//! Journaling is best-effort by contract: a full disk must not abort a
//! half-finished run, so record() never returns an error.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use colored::Colorize;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Success => "SUCCESS",
        }
    }
}

/// One recorded journal line (memory sink only; the file sink keeps lines
/// on disk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
}

// ---------------------------------------------------------------------------
// RunJournal
// ---------------------------------------------------------------------------

enum Sink {
    File(File),
    Memory(Vec<Entry>),
}

/// Severity-tagged run log with a file or in-memory sink.
///
/// The memory sink exists for tests: engines take `&RunJournal` and tests
/// assert on [`RunJournal::entries`] afterwards.
pub struct RunJournal {
    sink: Mutex<Sink>,
    echo: bool,
    path: Option<PathBuf>,
}

impl RunJournal {
    /// Open a fresh per-run log file `<home>/.picket/logs/<kind>-<stamp>.log`
    /// with console echo enabled.
    pub fn to_file_at(home: &Path, kind: &str) -> std::io::Result<RunJournal> {
        let dir = home.join(".picket").join("logs");
        std::fs::create_dir_all(&dir)?;
        let name = format!("{kind}-{}.log", Local::now().format("%Y%m%d-%H%M%S"));
        let path = dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(RunJournal {
            sink: Mutex::new(Sink::File(file)),
            echo: true,
            path: Some(path),
        })
    }

    /// In-memory journal with echo disabled.
    pub fn memory() -> RunJournal {
        RunJournal {
            sink: Mutex::new(Sink::Memory(Vec::new())),
            echo: false,
            path: None,
        }
    }

    /// Disable console echo (used by tests exercising the file sink).
    pub fn quiet(mut self) -> RunJournal {
        self.echo = false;
        self
    }

    /// Path of the log file, when this journal writes one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, severity: Severity, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{stamp}] [{}] {message}", severity.label());
        if self.echo {
            println!("{}", painted(&line, severity));
        }
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        match &mut *sink {
            Sink::File(f) => {
                let _ = writeln!(f, "{line}");
            }
            Sink::Memory(v) => v.push(Entry {
                severity,
                message: message.to_owned(),
            }),
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Severity::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Severity::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Severity::Error, message.as_ref());
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.record(Severity::Success, message.as_ref());
    }

    /// Recorded entries (memory sink). Empty for file journals.
    pub fn entries(&self) -> Vec<Entry> {
        match self.sink.lock() {
            Ok(sink) => match &*sink {
                Sink::Memory(v) => v.clone(),
                Sink::File(_) => Vec::new(),
            },
            Err(_) => Vec::new(),
        }
    }

    /// Messages of all recorded entries (memory sink), for test asserts.
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

fn painted(line: &str, severity: Severity) -> String {
    match severity {
        Severity::Info => line.to_owned(),
        Severity::Warn => line.yellow().to_string(),
        Severity::Error => line.red().to_string(),
        Severity::Success => line.green().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Info.label(), "INFO");
        assert_eq!(Severity::Warn.label(), "WARN");
        assert_eq!(Severity::Error.label(), "ERROR");
        assert_eq!(Severity::Success.label(), "SUCCESS");
    }

    #[test]
    fn memory_journal_records_in_order() {
        let journal = RunJournal::memory();
        journal.info("first");
        journal.warn("second");
        journal.success("third");
        let entries = journal.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].severity, Severity::Info);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].severity, Severity::Warn);
        assert_eq!(entries[2].severity, Severity::Success);
        assert_eq!(journal.messages(), vec!["first", "second", "third"]);
    }

    #[test]
    fn file_journal_writes_tagged_lines() {
        let home = TempDir::new().unwrap();
        let journal = RunJournal::to_file_at(home.path(), "apply")
            .expect("create journal")
            .quiet();
        journal.info("hello");
        journal.error("broke");

        let path = journal.path().expect("path").to_path_buf();
        assert!(path.starts_with(home.path().join(".picket").join("logs")));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("apply-") && name.ends_with(".log"));

        let contents = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].contains("[INFO] hello"));
        assert!(lines[1].contains("[ERROR] broke"));
    }

    #[test]
    fn file_journal_has_no_memory_entries() {
        let home = TempDir::new().unwrap();
        let journal = RunJournal::to_file_at(home.path(), "reset")
            .expect("create journal")
            .quiet();
        journal.info("x");
        assert!(journal.entries().is_empty());
    }
}
