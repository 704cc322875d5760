//! Unpack driver: verify, extract, then install a config pack.
use std::collections::BTreeMap;
use std::path::Path;

use super::archive::{self, FRAME_PREFIX, FUEL_PREFIX, MANIFEST_FILE};
use super::hash;
use crate::assemble::AssembleOptions;
use crate::config::{DirFuelSource, Manifest, ParamValue};
use crate::error::{PackError, RocketError};
use crate::hooks::{ExtractState, HookBus};
use crate::logging::Log;
use crate::output::{WriteOptions, write_file};
use crate::pipeline::{self, InstallReport};
use crate::prompt::{PromptError, PromptKind, PromptRequest, Prompter};

/// What to do with an archive that has no manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonAssemblyBehavior {
    /// Ask whether to extract it as-is.
    #[default]
    Prompt,
    /// Extract it as-is.
    Continue,
    /// Fail with [`PackError::NotAConfigPack`].
    Abort,
}

/// Options for [`unpack`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Expected SHA-256 of the archive, base64url or hex.
    pub sha256: Option<String>,
    /// Handling of archives without a manifest.
    pub non_assembly: NonAssemblyBehavior,
    /// Output directory, merge policy, parallelism and dry-run. The frame
    /// directory is always the staged `frame/`.
    pub assemble: AssembleOptions,
}

impl UnpackOptions {
    /// Options unpacking into `out_dir` with default settings.
    pub fn new(out_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            sha256: None,
            non_assembly: NonAssemblyBehavior::default(),
            assemble: AssembleOptions::new(out_dir),
        }
    }
}

/// Result of [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackOutcome {
    /// The archive was a config pack and was installed.
    Assembled(InstallReport),
    /// The archive was not a config pack and its entries were written as-is.
    Extracted {
        /// Number of entries written.
        files: usize,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackError + '_ {
    move |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn confirm_non_assembly(
    behavior: NonAssemblyBehavior,
    prompter: &dyn Prompter,
) -> Result<(), PackError> {
    match behavior {
        NonAssemblyBehavior::Continue => Ok(()),
        NonAssemblyBehavior::Abort => Err(PackError::NotAConfigPack),
        NonAssemblyBehavior::Prompt => {
            let request = PromptRequest {
                kind: PromptKind::Confirm,
                label: format!("Archive has no {MANIFEST_FILE}. Extract it anyway?"),
                default: Some(ParamValue::Bool(false)),
            };
            match prompter.prompt(&request) {
                Ok(answer) if answer.is_truthy() => Ok(()),
                Ok(_) => Err(PackError::NotAConfigPack),
                Err(PromptError::Cancelled) => Err(PackError::Aborted),
                Err(PromptError::Failed(_)) => Err(PackError::NotAConfigPack),
            }
        }
    }
}

fn extract_verbatim(
    entries: BTreeMap<String, Vec<u8>>,
    options: &AssembleOptions,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<usize, RocketError> {
    let write_options = WriteOptions {
        merge: options.merge,
        dry_run: options.dry_run,
    };
    let count = entries.len();
    for (name, bytes) in entries {
        if !archive::is_safe_name(&name) {
            return Err(PackError::UnsafeEntry { name }.into());
        }
        let written = write_file(&options.out_dir.join(&name), bytes, &write_options, hooks, log)?;
        log.record_file(&name, written.outcome, None);
    }
    Ok(count)
}

fn stage_entries(entries: &BTreeMap<String, Vec<u8>>, staging: &Path) -> Result<(), PackError> {
    for (name, bytes) in entries {
        if !archive::is_safe_name(name) {
            return Err(PackError::UnsafeEntry { name: name.clone() });
        }
        let path = staging.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        std::fs::write(&path, bytes).map_err(io_error(&path))?;
    }
    Ok(())
}

/// Verify, extract and install a config pack.
///
/// Entries are staged under `staging` (which the caller owns and removes),
/// the manifest is loaded from the staged `rocket.config.json5`, fuel is read
/// from the staged `fuel/` and the staged `frame/` is assembled into
/// `options.assemble.out_dir`.
///
/// # Errors
///
/// Returns [`PackError::ChecksumMismatch`] before anything is extracted,
/// [`PackError::NotAConfigPack`] / [`PackError::Aborted`] for refused plain
/// archives, and any extraction, resolution or assembly error.
pub fn unpack(
    bytes: &[u8],
    staging: &Path,
    options: &UnpackOptions,
    prompter: &dyn Prompter,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<UnpackOutcome, RocketError> {
    if let Some(expected) = &options.sha256 {
        hash::verify_checksum(bytes, expected)?;
        log.debug("checksum verified");
    }

    log.stage("Extracting");
    let mut entries = archive::unzip_entries(bytes)?;
    hooks
        .emit_extract(&mut ExtractState {
            entries: &mut entries,
        })
        .map_err(PackError::from)?;
    log.info(&format!("{} entries extracted", entries.len()));

    if !entries.contains_key(MANIFEST_FILE) {
        log.warn(&format!("archive has no {MANIFEST_FILE}"));
        confirm_non_assembly(options.non_assembly, prompter)?;
        let files = extract_verbatim(entries, &options.assemble, hooks, log)?;
        return Ok(UnpackOutcome::Extracted { files });
    }

    stage_entries(&entries, staging)?;
    drop(entries);

    let manifest = Manifest::load(&staging.join(MANIFEST_FILE))?;
    pipeline::log_manifest_warnings(&manifest, log);

    let fuel = DirFuelSource::new(staging.join(FUEL_PREFIX));
    let assemble_options = AssembleOptions {
        frame_dir: Some(staging.join(FRAME_PREFIX)),
        ..options.assemble.clone()
    };
    let report = pipeline::install(&manifest, Some(&fuel), &assemble_options, prompter, hooks, log)?;
    Ok(UnpackOutcome::Assembled(report))
}

/// [`unpack`] with a private staging directory that is removed on every exit
/// path.
///
/// # Errors
///
/// Returns [`PackError::Io`] if the staging directory cannot be created, or
/// any error from [`unpack`].
pub fn unpack_scoped(
    bytes: &[u8],
    options: &UnpackOptions,
    prompter: &dyn Prompter,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<UnpackOutcome, RocketError> {
    let staging = staging_dir()?;
    let outcome = unpack(bytes, staging.path(), options, prompter, hooks, log);
    let path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        log.warn(&format!("could not remove {}: {e}", path.display()));
    }
    outcome
}

/// Create a fresh staging directory under the system temp directory.
///
/// # Errors
///
/// Returns [`PackError::Io`] if the directory cannot be created.
pub fn staging_dir() -> Result<tempfile::TempDir, PackError> {
    tempfile::Builder::new()
        .prefix("config-rocket-")
        .tempdir()
        .map_err(io_error(&std::env::temp_dir()))
}
