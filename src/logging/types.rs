//! Core logging types: file entries, outcomes, and the [`Log`] trait.

/// One destination file handled during a run, kept for summary reporting.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Destination path, relative to the output directory when possible.
    pub path: String,
    /// What happened to the file.
    pub outcome: FileOutcome,
    /// Optional detail message (e.g., skip reason).
    pub message: Option<String>,
}

/// What the assembly pipeline did with one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was written fresh (no merge took place).
    Written,
    /// The file was merged with content already at the destination.
    Merged,
    /// A hook skipped the file.
    Skipped,
    /// The file was dropped by an exclude rule.
    Excluded,
    /// Dry-run mode: the file would have been written.
    DryRun,
}

/// Abstraction over logging backends.
///
/// Every pipeline stage receives a `&dyn Log` instead of reaching for a
/// global, so library callers decide where output goes. [`Logger`](super::Logger)
/// forwards to `tracing`; [`NullLog`](super::NullLog) discards everything.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a file outcome for the summary.
    fn record_file(&self, path: &str, outcome: FileOutcome, message: Option<&str>);
}
