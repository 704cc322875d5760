//! Zip container for config packs.
//!
//! A pack is a zip archive holding:
//!
//! ```text
//! rocket.config.json5   manifest (the marker that makes it a pack)
//! frame/...             files to assemble
//! fuel/...              referenced fuel content
//! ```
use std::collections::BTreeMap;
use std::io::{Cursor, Read as _, Write as _};
use std::path::Component;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::{Manifest, loader};
use crate::error::{PackError, RocketError};

/// Name of the manifest entry at the archive root.
pub const MANIFEST_FILE: &str = "rocket.config.json5";

/// Archive prefix of frame files.
pub const FRAME_PREFIX: &str = "frame";

/// Archive prefix of fuel files.
pub const FUEL_PREFIX: &str = "fuel";

/// Zip `entries` (deflate), in key order.
///
/// # Errors
///
/// Returns [`PackError::Archive`] if the codec fails.
pub fn zip_entries(entries: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, PackError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes).map_err(|e| PackError::Archive {
            message: format!("writing {name}: {e}"),
        })?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Return `true` if `name` is a relative path that stays inside its root.
pub(crate) fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\\')
        && std::path::Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Decompress every file entry of `bytes`; directory entries are skipped.
///
/// # Errors
///
/// Returns [`PackError::UnsafeEntry`] for a name that is absolute or leaves
/// the extraction root, or [`PackError::Archive`] for a corrupt archive.
pub fn unzip_entries(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, PackError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        if file.enclosed_name().is_none() || !is_safe_name(&name) {
            return Err(PackError::UnsafeEntry { name });
        }
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut content).map_err(|e| PackError::Archive {
            message: format!("reading {name}: {e}"),
        })?;
        entries.insert(name, content);
    }
    Ok(entries)
}

fn read_manifest_entry(bytes: &[u8]) -> Result<Option<Vec<u8>>, PackError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut file = match archive.by_name(MANIFEST_FILE) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content).map_err(|e| PackError::Archive {
        message: format!("reading {MANIFEST_FILE}: {e}"),
    })?;
    Ok(Some(content))
}

/// Parse and validate the manifest of a pack without extracting the frame.
///
/// # Errors
///
/// Returns [`PackError::NotAConfigPack`] if the marker entry is missing, or
/// a config error if the manifest is invalid.
pub fn extract_manifest(bytes: &[u8]) -> Result<Manifest, RocketError> {
    let content = read_manifest_entry(bytes)?.ok_or(PackError::NotAConfigPack)?;
    let text = String::from_utf8_lossy(&content);
    let document = loader::parse_document(std::path::Path::new(MANIFEST_FILE), &text)?;
    Ok(Manifest::from_value(document)?)
}

/// Return `true` if `bytes` is a zip archive with a valid manifest.
#[must_use]
pub fn is_config_pack(bytes: &[u8]) -> bool {
    extract_manifest(bytes).is_ok()
}

/// Return `true` if `bytes` is a config pack that declares parameters.
#[must_use]
pub fn config_pack_has_parameters(bytes: &[u8]) -> bool {
    extract_manifest(bytes).is_ok_and(|m| m.has_parameters())
}
