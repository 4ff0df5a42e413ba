use crate::record::Level;
use crate::sink::Appender;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Appends JSON lines to a single file, creating parent directories on
/// construction. No color, no layout: files stay machine-parseable.
pub struct FileAppender {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileAppender {
    /// Open (or create) the target file in append mode.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(FileAppender {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&self, _level: Level, line: &str) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            eprintln!("log file write failed ({}): {}", self.path.display(), e);
        }
    }
}

/// Mirrors the all-levels stream to standard output, one JSON line per
/// record, no ANSI escapes.
#[derive(Clone, Copy, Default)]
pub struct StdoutAppender;

impl Appender for StdoutAppender {
    fn append(&self, _level: Level, line: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "{}", line);
    }
}

/// Wraps another appender and forwards only records at or above a minimum
/// level. This is how the error-only file is derived from the same stream
/// that feeds the all-levels file.
pub struct LevelFilter {
    min: Level,
    inner: Box<dyn Appender>,
}

impl LevelFilter {
    pub fn new(min: Level, inner: Box<dyn Appender>) -> Self {
        LevelFilter { min, inner }
    }
}

impl Appender for LevelFilter {
    fn append(&self, level: Level, line: &str) {
        if level >= self.min {
            self.inner.append(level, line);
        }
    }
}

/// An appender that captures lines in memory.
///
/// Useful for asserting on emitted records in unit tests without touching
/// the filesystem, and for measuring record-building overhead in isolation.
#[derive(Clone, Default)]
pub struct MemoryAppender {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn lines(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Appender for MemoryAppender {
    fn append(&self, level: Level, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((level, line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_appender_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("svc.log");
        let appender = FileAppender::new(&path).unwrap();

        appender.append(Level::Info, r#"{"eventName":"a"}"#);
        appender.append(Level::Error, r#"{"eventName":"b"}"#);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec![r#"{"eventName":"a"}"#, r#"{"eventName":"b"}"#]);
    }

    #[test]
    fn level_filter_blocks_below_minimum() {
        let capture = MemoryAppender::new();
        let filtered = LevelFilter::new(Level::Error, Box::new(capture.clone()));

        filtered.append(Level::Info, "info line");
        filtered.append(Level::Warn, "warn line");
        filtered.append(Level::Error, "error line");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], (Level::Error, "error line".to_string()));
    }

    #[test]
    fn memory_appender_preserves_order() {
        let capture = MemoryAppender::new();
        capture.append(Level::Warn, "first");
        capture.append(Level::Info, "second");
        let lines = capture.lines();
        assert_eq!(lines[0].1, "first");
        assert_eq!(lines[1].1, "second");
    }
}
