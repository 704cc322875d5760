//! Single-file output with format-aware merging.
//!
//! [`write_file`] decides how a file combines with what is already at the
//! destination:
//!
//! | extension        | merge type | merged how                         |
//! |------------------|------------|------------------------------------|
//! | `.json`          | json       | parse both, deep merge, pretty JSON |
//! | `.yaml` / `.yml` | yaml       | parse both, deep merge, YAML       |
//! | anything else    | concat     | existing bytes, then new bytes     |
//!
//! `on_write` listeners see the full [`FileOutputState`] before anything is
//! touched and may change the path, data, merge type or eligibility.
//! `on_merge` listeners run once existing content is loaded (and parsed for
//! json/yaml) and may supply `merge_result`; a `custom` merge type requires
//! them to.
pub mod fs;
pub mod merge;

use std::path::{Path, PathBuf};

use self::merge::DeepMerge as _;
use crate::error::OutputError;
use crate::hooks::HookBus;
use crate::logging::{FileOutcome, Log};

/// How a file's format is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeType {
    /// JSON deep merge.
    Json,
    /// YAML deep merge.
    Yaml,
    /// Byte concatenation.
    Concat,
    /// Merge supplied by an `on_merge` listener.
    Custom,
}

impl MergeType {
    /// Merge type implied by the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Concat,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Concat => "concat",
            Self::Custom => "custom",
        }
    }
}

/// Which files may merge with existing destination content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Always overwrite.
    #[default]
    Off,
    /// Merge every file; text files are concatenated.
    Concat,
    /// Merge structured files only (json, yaml, custom); overwrite the rest.
    Deep,
}

impl MergeMode {
    /// Whether a file of `merge_type` merges under this mode.
    #[must_use]
    pub fn is_eligible(self, merge_type: MergeType) -> bool {
        match self {
            Self::Off => false,
            Self::Concat => true,
            Self::Deep => merge_type != MergeType::Concat,
        }
    }
}

/// Both sides of a structured merge, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMerge {
    /// JSON documents.
    Json {
        /// Content already at the destination.
        existing: serde_json::Value,
        /// Content being written.
        incoming: serde_json::Value,
    },
    /// YAML documents.
    Yaml {
        /// Content already at the destination.
        existing: serde_yaml::Value,
        /// Content being written.
        incoming: serde_yaml::Value,
    },
}

/// Mutable state for one file write, shared with `on_write` and `on_merge`
/// listeners. Created per call and dropped when the write completes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutputState {
    /// Destination path.
    pub path: PathBuf,
    /// Bytes to write.
    pub data: Vec<u8>,
    /// Merge strategy.
    pub merge_type: MergeType,
    /// Whether existing content at `path` is merged rather than replaced.
    pub is_merge_eligible: bool,
    /// Content already at the destination, loaded before `on_merge`.
    pub existing: Option<Vec<u8>>,
    /// Parsed documents for json/yaml merges, available to `on_merge`.
    pub parsed: Option<ParsedMerge>,
    /// Final bytes supplied by a listener, replacing the built-in merge.
    pub merge_result: Option<Vec<u8>>,
}

/// Options for [`write_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Merge policy.
    pub merge: MergeMode,
    /// Compute the result but do not touch the file system.
    pub dry_run: bool,
}

/// What [`write_file`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Final destination (listeners may have moved it).
    pub path: PathBuf,
    /// [`FileOutcome::Written`], [`FileOutcome::Merged`] or [`FileOutcome::DryRun`].
    pub outcome: FileOutcome,
}

/// Write one file, merging with existing content as the options and the
/// file's merge type allow.
///
/// An existing destination that is empty or whitespace-only is replaced
/// rather than merged.
///
/// # Errors
///
/// Returns [`OutputError::MergeParseError`] if either side of a json/yaml
/// merge is malformed, [`OutputError::InvalidMergeInput`] if the new data is
/// not UTF-8 text, [`OutputError::MissingCustomMergeResult`] if a custom merge
/// got no result, or an I/O or hook error. Nothing is written on error.
pub fn write_file(
    path: &Path,
    data: Vec<u8>,
    options: &WriteOptions,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<WriteOutcome, OutputError> {
    let merge_type = MergeType::from_path(path);
    let mut state = FileOutputState {
        path: path.to_path_buf(),
        data,
        merge_type,
        is_merge_eligible: options.merge.is_eligible(merge_type),
        existing: None,
        parsed: None,
        merge_result: None,
    };
    hooks.emit_write(&mut state)?;

    if !options.dry_run {
        fs::ensure_parent_dir(&state.path)?;
    }

    // A blank json/yaml file holds no document to merge into; it is replaced.
    let structured = matches!(state.merge_type, MergeType::Json | MergeType::Yaml);
    let existing = if state.is_merge_eligible {
        fs::read_existing(&state.path)?
            .filter(|bytes| !(structured && bytes.trim_ascii().is_empty()))
    } else {
        None
    };

    let (bytes, outcome) = match existing {
        Some(existing) => {
            log.debug(&format!(
                "merging {} ({})",
                state.path.display(),
                state.merge_type.label()
            ));
            state.existing = Some(existing);
            (merge(&mut state, hooks)?, FileOutcome::Merged)
        }
        None => (std::mem::take(&mut state.data), FileOutcome::Written),
    };

    if options.dry_run {
        log.dry_run(&format!("would write {}", state.path.display()));
        return Ok(WriteOutcome {
            path: state.path,
            outcome: FileOutcome::DryRun,
        });
    }

    fs::atomic_write(&state.path, &bytes)?;
    Ok(WriteOutcome {
        path: state.path,
        outcome,
    })
}

fn merge(state: &mut FileOutputState, hooks: &mut HookBus) -> Result<Vec<u8>, OutputError> {
    if matches!(state.merge_type, MergeType::Json | MergeType::Yaml) {
        state.parsed = Some(parse_pair(state)?);
    }

    hooks.emit_merge(state)?;

    if let Some(result) = state.merge_result.take() {
        return Ok(result);
    }

    match state.merge_type {
        MergeType::Custom => Err(OutputError::MissingCustomMergeResult {
            path: state.path.clone(),
        }),
        MergeType::Concat => {
            let mut bytes = state.existing.take().unwrap_or_default();
            bytes.extend_from_slice(&state.data);
            Ok(bytes)
        }
        MergeType::Json | MergeType::Yaml => {
            let parsed = match state.parsed.take() {
                Some(parsed) => parsed,
                None => parse_pair(state)?,
            };
            serialize_merged(&state.path, parsed)
        }
    }
}

fn parse_pair(state: &FileOutputState) -> Result<ParsedMerge, OutputError> {
    let format = state.merge_type.label();
    let incoming = std::str::from_utf8(&state.data).map_err(|_| OutputError::InvalidMergeInput {
        path: state.path.clone(),
        format,
    })?;
    let existing = std::str::from_utf8(state.existing.as_deref().unwrap_or_default()).map_err(|e| {
        OutputError::MergeParseError {
            path: state.path.clone(),
            format,
            message: format!("existing content is not UTF-8: {e}"),
        }
    })?;

    let parse_error = |side: &str, message: String| OutputError::MergeParseError {
        path: state.path.clone(),
        format,
        message: format!("{side} content: {message}"),
    };

    if state.merge_type == MergeType::Yaml {
        Ok(ParsedMerge::Yaml {
            existing: serde_yaml::from_str(existing)
                .map_err(|e| parse_error("existing", e.to_string()))?,
            incoming: serde_yaml::from_str(incoming)
                .map_err(|e| parse_error("new", e.to_string()))?,
        })
    } else {
        Ok(ParsedMerge::Json {
            existing: serde_json::from_str(existing)
                .map_err(|e| parse_error("existing", e.to_string()))?,
            incoming: serde_json::from_str(incoming)
                .map_err(|e| parse_error("new", e.to_string()))?,
        })
    }
}

fn serialize_merged(path: &Path, parsed: ParsedMerge) -> Result<Vec<u8>, OutputError> {
    match parsed {
        ParsedMerge::Json { existing, incoming } => {
            let mut text = serde_json::to_string_pretty(&existing.deep_merge(incoming)).map_err(|e| {
                OutputError::Serialize {
                    path: path.to_path_buf(),
                    format: "json",
                    message: e.to_string(),
                }
            })?;
            text.push('\n');
            Ok(text.into_bytes())
        }
        ParsedMerge::Yaml { existing, incoming } => serde_yaml::to_string(&existing.deep_merge(incoming))
            .map(String::into_bytes)
            .map_err(|e| OutputError::Serialize {
                path: path.to_path_buf(),
                format: "yaml",
                message: e.to_string(),
            }),
    }
}
