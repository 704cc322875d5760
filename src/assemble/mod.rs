//! Frame assembly: turn a frame directory plus a resolved environment into
//! files in the output directory.
//!
//! Candidates come from two sources, frame files first and builder files
//! second, so a builder file wins over a frame file at the same destination.
//! Every candidate goes through three phases:
//!
//! 1. **select** (sequential): `on_frame_file` listeners may rename or skip
//!    the file, then exclude rules are checked against the final path;
//! 2. **render** (parallel when enabled): frame bytes are read from the
//!    original path and substituted when they are UTF-8 text;
//! 3. **write** (sequential, candidate order): [`write_file`] merges with the
//!    destination.
//!
//! Writes never run concurrently, so two candidates with the same
//! destination are applied one after the other.
pub mod substitute;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::config::ResolvedEnvironment;
use crate::error::AssembleError;
use crate::hooks::HookBus;
use crate::logging::{FileOutcome, Log};
use crate::output::{MergeMode, WriteOptions, write_file};

/// Where a candidate file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOrigin {
    /// A file under the frame directory.
    Frame,
    /// A file-builder entry.
    Builder {
        /// Builder key.
        key: String,
    },
}

/// Mutable state for [`RocketHooks::on_frame_file`](crate::hooks::RocketHooks::on_frame_file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFileState {
    /// Destination path relative to the output directory, `/`-separated.
    pub path: String,
    /// Source of the file.
    pub origin: FileOrigin,
    skip_reason: Option<String>,
}

impl FrameFileState {
    /// Create a state for a candidate at `path`.
    pub fn new(path: impl Into<String>, origin: FileOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
            skip_reason: None,
        }
    }

    /// Omit this file. The first reason given is kept.
    pub fn skip(&mut self, reason: impl Into<String>) {
        if self.skip_reason.is_none() {
            self.skip_reason = Some(reason.into());
        }
    }

    /// Why the file was skipped, if it was.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }
}

/// Options for [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Frame directory; `None` assembles builder files only.
    pub frame_dir: Option<PathBuf>,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Merge policy for every write.
    pub merge: MergeMode,
    /// Render files on the rayon pool.
    pub parallel: bool,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

impl AssembleOptions {
    /// Options writing to `out_dir` with deep merging and parallel rendering.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            frame_dir: None,
            out_dir: out_dir.into(),
            merge: MergeMode::Deep,
            parallel: true,
            dry_run: false,
        }
    }

    /// Set the frame directory.
    #[must_use]
    pub fn with_frame_dir(mut self, frame_dir: impl Into<PathBuf>) -> Self {
        self.frame_dir = Some(frame_dir.into());
        self
    }
}

/// One candidate file and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    /// Destination path relative to the output directory.
    pub path: String,
    /// Source of the file.
    pub origin: FileOrigin,
    /// Outcome.
    pub outcome: FileOutcome,
    /// Skip reason, when a hook skipped the file.
    pub reason: Option<String>,
}

/// Result of [`assemble`], in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembleReport {
    /// Every candidate file.
    pub files: Vec<AssembledFile>,
}

impl AssembleReport {
    /// Number of files with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: FileOutcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }

    /// Outcome recorded for `path`, last one wins.
    #[must_use]
    pub fn outcome_of(&self, path: &str) -> Option<FileOutcome> {
        self.files.iter().rev().find(|f| f.path == path).map(|f| f.outcome)
    }
}

enum Source {
    Frame(PathBuf),
    Builder(String),
}

struct Candidate {
    state: FrameFileState,
    source: Source,
}

/// List every file under `dir` (dot-files included) as sorted
/// `/`-separated relative paths.
///
/// # Errors
///
/// Returns [`AssembleError::Io`] if a directory cannot be read.
pub fn list_frame_files(dir: &Path) -> Result<Vec<String>, AssembleError> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), AssembleError> {
        let io = |source| AssembleError::Io {
            path: dir.to_path_buf(),
            source,
        };
        for entry in std::fs::read_dir(dir).map_err(io)? {
            let entry = entry.map_err(io)?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(dir, dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn checked_destination(out_dir: &Path, relative: &str) -> Result<PathBuf, AssembleError> {
    let path = Path::new(relative);
    let safe = !relative.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(out_dir.join(path))
    } else {
        Err(AssembleError::UnsafePath {
            path: relative.to_string(),
        })
    }
}

fn render(
    candidate: &Candidate,
    variables: &BTreeMap<String, String>,
) -> Result<Vec<u8>, AssembleError> {
    let not_converged = |e: substitute::NotConverged| AssembleError::SubstitutionDidNotConverge {
        path: candidate.state.path.clone(),
        passes: e.passes,
    };
    match &candidate.source {
        Source::Frame(path) => {
            let bytes = std::fs::read(path).map_err(|source| AssembleError::Io {
                path: path.clone(),
                source,
            })?;
            match String::from_utf8(bytes) {
                Ok(text) => Ok(substitute::substitute(&text, variables)
                    .map_err(not_converged)?
                    .into_bytes()),
                Err(binary) => Ok(binary.into_bytes()),
            }
        }
        Source::Builder(content) => Ok(substitute::substitute(content, variables)
            .map_err(not_converged)?
            .into_bytes()),
    }
}

/// Assemble the frame and builder files of `env` into the output directory.
///
/// Files skipped by a hook or an exclude rule are recorded in the report and
/// the log, never written. In dry-run mode nothing is created on disk.
///
/// # Errors
///
/// Stops at the first failure: an unreadable frame, a hook abort, a path
/// outside the output directory, substitution that does not converge, or a
/// write error. Files written before the failure stay written.
pub fn assemble(
    env: &ResolvedEnvironment,
    options: &AssembleOptions,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<AssembleReport, AssembleError> {
    let mut candidates = Vec::new();
    if let Some(frame_dir) = &options.frame_dir {
        if frame_dir.is_dir() {
            for relative in list_frame_files(frame_dir)? {
                candidates.push(Candidate {
                    source: Source::Frame(frame_dir.join(&relative)),
                    state: FrameFileState::new(relative, FileOrigin::Frame),
                });
            }
        } else {
            log.warn(&format!("frame directory {} not found", frame_dir.display()));
        }
    }
    for (key, built) in &env.files_builder {
        candidates.push(Candidate {
            state: FrameFileState::new(built.path.clone(), FileOrigin::Builder { key: key.clone() }),
            source: Source::Builder(built.content.clone()),
        });
    }
    log.debug(&format!("{} candidate files", candidates.len()));

    let mut report = AssembleReport::default();
    let mut selected = Vec::with_capacity(candidates.len());
    for mut candidate in candidates {
        hooks.emit_frame_file(&mut candidate.state)?;
        let state = &candidate.state;
        let outcome = if state.skip_reason().is_some() {
            FileOutcome::Skipped
        } else if env.is_excluded(&state.path) {
            FileOutcome::Excluded
        } else {
            selected.push(candidate);
            continue;
        };
        log.debug(&format!("{}: {outcome:?}", state.path));
        log.record_file(&state.path, outcome, state.skip_reason());
        report.files.push(AssembledFile {
            path: state.path.clone(),
            origin: state.origin.clone(),
            outcome,
            reason: state.skip_reason().map(String::from),
        });
    }

    let rendered: Vec<Vec<u8>> = if options.parallel {
        use rayon::prelude::*;
        selected
            .par_iter()
            .map(|c| render(c, &env.variables))
            .collect::<Result<_, _>>()?
    } else {
        selected
            .iter()
            .map(|c| render(c, &env.variables))
            .collect::<Result<_, _>>()?
    };

    let write_options = WriteOptions {
        merge: options.merge,
        dry_run: options.dry_run,
    };
    for (candidate, bytes) in selected.into_iter().zip(rendered) {
        let destination = checked_destination(&options.out_dir, &candidate.state.path)?;
        let written = write_file(&destination, bytes, &write_options, hooks, log)?;
        log.record_file(&candidate.state.path, written.outcome, None);
        report.files.push(AssembledFile {
            path: candidate.state.path,
            origin: candidate.state.origin,
            outcome: written.outcome,
            reason: None,
        });
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::BuiltFile;
    use crate::hooks::{HookResult, RocketHooks};
    use crate::logging::NullLog;
    use std::fs;

    struct Fixture {
        _tmp: tempfile::TempDir,
        frame: PathBuf,
        out: PathBuf,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let frame = tmp.path().join("frame");
        let out = tmp.path().join("out");
        for (path, content) in files {
            let target = frame.join(path);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, content).unwrap();
        }
        fs::create_dir_all(&frame).unwrap();
        Fixture { _tmp: tmp, frame, out }
    }

    fn options(fx: &Fixture) -> AssembleOptions {
        AssembleOptions::new(&fx.out).with_frame_dir(&fx.frame)
    }

    fn env_with(variables: &[(&str, &str)]) -> ResolvedEnvironment {
        ResolvedEnvironment {
            variables: variables
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..ResolvedEnvironment::default()
        }
    }

    #[test]
    fn lists_nested_and_hidden_files_sorted() {
        let fx = fixture(&[("b.txt", ""), (".hidden", ""), ("dir/a.txt", "")]);
        assert_eq!(
            list_frame_files(&fx.frame).unwrap(),
            vec![".hidden", "b.txt", "dir/a.txt"]
        );
    }

    #[test]
    fn substitutes_variables_in_frame_files() {
        let fx = fixture(&[("README.md", "# {{TITLE}}\n")]);
        let env = env_with(&[("{{TITLE}}", "Rocket")]);
        let report = assemble(&env, &options(&fx), &mut HookBus::new(), &NullLog).unwrap();
        assert_eq!(fs::read_to_string(fx.out.join("README.md")).unwrap(), "# Rocket\n");
        assert_eq!(report.count(FileOutcome::Written), 1);
    }

    #[test]
    fn binary_frame_files_pass_through() {
        let fx = fixture(&[]);
        let bytes = vec![0xff, b'{', b'{', b'X', b'}', b'}'];
        fs::write(fx.frame.join("logo.bin"), &bytes).unwrap();
        let env = env_with(&[("{{X}}", "y")]);
        assemble(&env, &options(&fx), &mut HookBus::new(), &NullLog).unwrap();
        assert_eq!(fs::read(fx.out.join("logo.bin")).unwrap(), bytes);
    }

    #[test]
    fn excluded_files_are_never_written() {
        let fx = fixture(&[("keep.txt", "k"), ("drop.txt", "d")]);
        let mut env = env_with(&[]);
        env.excludes.insert("drop.txt".to_string(), true);
        env.excludes.insert("keep.txt".to_string(), false);
        env.files_builder.insert(
            "also-drop".to_string(),
            BuiltFile {
                path: "drop.txt".to_string(),
                content: "built".to_string(),
            },
        );
        let report = assemble(&env, &options(&fx), &mut HookBus::new(), &NullLog).unwrap();
        assert!(fx.out.join("keep.txt").exists());
        assert!(!fx.out.join("drop.txt").exists());
        assert_eq!(report.count(FileOutcome::Excluded), 2);
    }

    #[test]
    fn builder_file_wins_over_frame_file() {
        let fx = fixture(&[("notes.txt", "from frame\n")]);
        let mut env = env_with(&[("{{WHO}}", "builder")]);
        env.files_builder.insert(
            "notes".to_string(),
            BuiltFile {
                path: "notes.txt".to_string(),
                content: "from {{WHO}}\n".to_string(),
            },
        );
        let mut opts = options(&fx);
        opts.merge = MergeMode::Off;
        assemble(&env, &opts, &mut HookBus::new(), &NullLog).unwrap();
        assert_eq!(fs::read_to_string(fx.out.join("notes.txt")).unwrap(), "from builder\n");
    }

    #[test]
    fn repeated_assembly_merges_json() {
        let fx = fixture(&[("a.json", r#"{"x":1}"#)]);
        fs::create_dir_all(&fx.out).unwrap();
        fs::write(fx.out.join("a.json"), r#"{"y":2}"#).unwrap();
        let report = assemble(&env_with(&[]), &options(&fx), &mut HookBus::new(), &NullLog).unwrap();
        let merged: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(fx.out.join("a.json")).unwrap()).unwrap();
        assert_eq!(merged, serde_json::json!({"y": 2, "x": 1}));
        assert_eq!(report.outcome_of("a.json"), Some(FileOutcome::Merged));
    }

    struct RenameAndSkip;

    impl RocketHooks for RenameAndSkip {
        fn on_frame_file(&mut self, state: &mut FrameFileState) -> HookResult {
            if state.path == "template.env" {
                state.path = ".env".to_string();
            }
            if state.path.ends_with(".tmp") {
                state.skip("scratch file");
                state.skip("ignored second reason");
            }
            Ok(())
        }
    }

    #[test]
    fn hooks_rename_and_skip() {
        let fx = fixture(&[("template.env", "A=1\n"), ("cache.tmp", "x")]);
        let report = assemble(
            &env_with(&[]),
            &options(&fx),
            &mut HookBus::new().with(RenameAndSkip),
            &NullLog,
        )
        .unwrap();
        assert_eq!(fs::read_to_string(fx.out.join(".env")).unwrap(), "A=1\n");
        assert!(!fx.out.join("cache.tmp").exists());
        let skipped = report.files.iter().find(|f| f.path == "cache.tmp").unwrap();
        assert_eq!(skipped.reason.as_deref(), Some("scratch file"));
    }

    #[test]
    fn exclude_applies_to_renamed_path() {
        let fx = fixture(&[("template.env", "A=1\n")]);
        let mut env = env_with(&[]);
        env.excludes.insert(".env".to_string(), true);
        let report = assemble(&env, &options(&fx), &mut HookBus::new().with(RenameAndSkip), &NullLog)
            .unwrap();
        assert_eq!(report.outcome_of(".env"), Some(FileOutcome::Excluded));
    }

    #[test]
    fn builder_path_cannot_escape_output() {
        let fx = fixture(&[]);
        let mut env = env_with(&[]);
        env.files_builder.insert(
            "evil".to_string(),
            BuiltFile {
                path: "../outside.txt".to_string(),
                content: "x".to_string(),
            },
        );
        let err = assemble(&env, &options(&fx), &mut HookBus::new(), &NullLog).unwrap_err();
        assert!(matches!(err, AssembleError::UnsafePath { .. }));
    }

    #[test]
    fn cyclic_variables_fail_with_path() {
        let fx = fixture(&[("loop.txt", "{{A}}")]);
        let env = env_with(&[("{{A}}", "{{A}}{{A}}")]);
        let mut opts = options(&fx);
        opts.parallel = false;
        let err = assemble(&env, &opts, &mut HookBus::new(), &NullLog).unwrap_err();
        assert!(matches!(err, AssembleError::SubstitutionDidNotConverge { ref path, .. } if path == "loop.txt"));
        assert!(!fx.out.join("loop.txt").exists());
    }

    #[test]
    fn dry_run_creates_nothing() {
        let fx = fixture(&[("a/b.txt", "x")]);
        let mut opts = options(&fx);
        opts.dry_run = true;
        let report = assemble(&env_with(&[]), &opts, &mut HookBus::new(), &NullLog).unwrap();
        assert!(!fx.out.exists());
        assert_eq!(report.count(FileOutcome::DryRun), 1);
    }
}
