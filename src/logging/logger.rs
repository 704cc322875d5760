//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{FileEntry, FileOutcome, Log};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// `record_file` is not included because its signature differs from the
/// `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Messages go through `tracing`; the subscriber installed by
/// [`init_subscriber`](super::init_subscriber) also appends them to
/// `$XDG_CACHE_HOME/config-rocket/<command>.log` with ANSI codes stripped.
#[derive(Debug)]
pub struct Logger {
    files: Mutex<Vec<FileEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded file entries.
    #[must_use]
    pub fn file_entries(&self) -> Vec<FileEntry> {
        self.files.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "config_rocket::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: "config_rocket::dry_run", "{msg}");
    }

    /// Record a file outcome for the summary.
    pub fn record_file(&self, path: &str, outcome: FileOutcome, message: Option<&str>) {
        if let Ok(mut guard) = self.files.lock() {
            guard.push(FileEntry {
                path: path.to_string(),
                outcome,
                message: message.map(String::from),
            });
        }
    }

    /// Count the recorded files with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: FileOutcome) -> usize {
        self.files.lock().map_or(0, |guard| {
            guard.iter().filter(|f| f.outcome == outcome).count()
        })
    }

    /// Print the summary of all recorded files.
    pub fn print_summary(&self) {
        let files = self.file_entries();
        if files.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut written = 0u32;
        let mut merged = 0u32;
        let mut skipped = 0u32;
        let mut excluded = 0u32;
        let mut dry_run = 0u32;

        for file in &files {
            let (icon, color) = match file.outcome {
                FileOutcome::Written => {
                    written += 1;
                    ("✓", "\x1b[32m")
                }
                FileOutcome::Merged => {
                    merged += 1;
                    ("±", "\x1b[36m")
                }
                FileOutcome::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                FileOutcome::Excluded => {
                    excluded += 1;
                    ("·", "\x1b[2m")
                }
                FileOutcome::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
            };

            let suffix = file
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", file.path));
        }

        let total = written + merged + skipped + excluded + dry_run;
        self.info(&format!(
            "{total} files: \x1b[32m{written} written\x1b[0m, \x1b[36m{merged} merged\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[2m{excluded} excluded\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_file(&self, path: &str, outcome: FileOutcome, message: Option<&str>) {
        self.record_file(path, outcome, message);
    }
}

/// A [`Log`] that discards every message and record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl Log for NullLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, _msg: &str) {}
    fn record_file(&self, _path: &str, _outcome: FileOutcome, _message: Option<&str>) {}
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.file_entries().is_empty(), "expected empty file list");
    }

    #[test]
    fn record_file_written() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_file("a.json", FileOutcome::Written, None);
        let files = log.file_entries();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.json");
        assert_eq!(files[0].outcome, FileOutcome::Written);
    }

    #[test]
    fn record_file_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_file(".env", FileOutcome::Skipped, Some("local only"));
        assert_eq!(log.file_entries()[0].message, Some("local only".to_string()));
    }

    #[test]
    fn count_filters_by_outcome() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_file("a", FileOutcome::Written, None);
        log.record_file("b", FileOutcome::Merged, None);
        log.record_file("c", FileOutcome::Merged, None);
        log.record_file("d", FileOutcome::Excluded, None);
        assert_eq!(log.count(FileOutcome::Merged), 2);
        assert_eq!(log.count(FileOutcome::Written), 1);
        assert_eq!(log.count(FileOutcome::DryRun), 0);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_file("via-trait", FileOutcome::Written, None);
        assert_eq!(log.file_entries().len(), 1);
    }

    #[test]
    fn info_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("info-marker-{}", std::process::id());
        log.info(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains(&marker), "info message should appear in log file");
    }

    #[test]
    fn warn_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("warn-marker-{}", std::process::id());
        log.warn(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[warn]"), "warn tag should appear in log file");
        assert!(contents.contains(&marker));
    }

    #[test]
    fn stage_written_to_file_with_arrow() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("stage-marker-{}", std::process::id());
        log.stage(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("==>"), "stage arrow should appear in log file");
        assert!(contents.contains(&marker));
    }

    #[test]
    fn dry_run_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("dryrun-marker-{}", std::process::id());
        log.dry_run(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[dry run]"), "dry run tag should appear in log file");
        assert!(contents.contains(&marker));
    }

    #[test]
    fn null_log_accepts_everything() {
        let log: &dyn Log = &NullLog;
        log.stage("stage");
        log.record_file("x", FileOutcome::Written, Some("ignored"));
    }
}
