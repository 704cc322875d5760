//! Zipping arbitrary files picked by glob patterns.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::archive::zip_entries;
use super::hash::{HashEncoding, hash_bytes};
use crate::assemble::list_frame_files;
use crate::error::{PackError, RocketError};
use crate::logging::Log;

/// Default output file of the `zip` command.
pub const DEFAULT_ARCHIVE_NAME: &str = "rocket-archive.zip";

/// A written (or, in dry-run mode, built) archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Archive path.
    pub path: PathBuf,
    /// Base64url SHA-256 of the archive.
    pub sha256: String,
    /// Number of archive entries.
    pub entries: usize,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, PackError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .map_err(|e| PackError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| PackError::InvalidGlob {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Files below `root` matching any `include` pattern and no `exclude`
/// pattern, as sorted `/`-separated relative paths.
///
/// `*` does not cross `/`; use `**` to match nested directories.
///
/// # Errors
///
/// Returns [`PackError::InvalidGlob`] for a malformed pattern,
/// [`PackError::NothingToArchive`] when nothing matches, or an I/O error if
/// `root` cannot be walked.
pub fn select_files(root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<String>, RocketError> {
    let include = build_globset(include)?;
    let exclude = build_globset(exclude)?;
    let files: Vec<_> = list_frame_files(root)?
        .into_iter()
        .filter(|file| include.is_match(file) && !exclude.is_match(file))
        .collect();
    if files.is_empty() {
        return Err(PackError::NothingToArchive.into());
    }
    Ok(files)
}

/// Zip `files` (relative to `root`) into `output`.
///
/// # Errors
///
/// Returns [`PackError::Io`] if a file cannot be read or the archive cannot
/// be written, or [`PackError::Archive`] on a codec failure.
pub fn archive_files(
    root: &Path,
    files: &[String],
    output: &Path,
    dry_run: bool,
    log: &dyn Log,
) -> Result<ArchiveReport, PackError> {
    let mut entries = BTreeMap::new();
    for relative in files {
        let path = root.join(relative);
        let bytes = std::fs::read(&path).map_err(|source| PackError::Io { path, source })?;
        entries.insert(relative.clone(), bytes);
    }

    let archive = zip_entries(&entries)?;
    let sha256 = hash_bytes(&archive, HashEncoding::Base64Url);
    if dry_run {
        log.dry_run(&format!("would write {} ({} bytes)", output.display(), archive.len()));
    } else {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PackError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(output, &archive).map_err(|source| PackError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        log.info(&format!("zipped {} (sha256 {sha256})", output.display()));
    }

    Ok(ArchiveReport {
        path: output.to_path_buf(),
        sha256,
        entries: entries.len(),
    })
}
