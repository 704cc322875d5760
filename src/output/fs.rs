//! File-system helpers for the output stage.
use std::io::Write as _;
use std::path::Path;

use crate::error::OutputError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary. Safe to call concurrently for the same directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    Ok(())
}

/// Read `path` if it is an existing file.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, OutputError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Temporary-file builder whose files get the mode a plain create would give
/// (`0o666` minus the umask) instead of `tempfile`'s owner-only default.
fn temp_builder<'a, 'b>() -> tempfile::Builder<'a, 'b> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}

/// Replace `path` with `content` atomically.
///
/// The bytes go to a temporary file in the destination directory, are synced,
/// and the temporary file is then renamed over the target, so readers never
/// observe a partially written file. An existing destination keeps its
/// permissions; a new file gets the default mode for the current umask.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), OutputError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let existing = std::fs::metadata(path)
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|m| m.permissions());

    let mut tmp = temp_builder().tempfile_in(dir).map_err(io_error(path))?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(io_error(path))?;
    }
    tmp.write_all(content).map_err(io_error(path))?;
    tmp.as_file().sync_all().map_err(io_error(path))?;
    tmp.persist(path).map_err(|e| io_error(path)(e.error))?;
    Ok(())
}
