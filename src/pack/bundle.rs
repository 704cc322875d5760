//! Building a config pack from a frame directory.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::archive::{FRAME_PREFIX, FUEL_PREFIX, MANIFEST_FILE, zip_entries};
use super::hash::{HashEncoding, hash_bytes};
use crate::assemble::list_frame_files;
use crate::config::{DirFuelSource, FuelSource, Manifest, extract_referenced_fuels, loader};
use crate::error::{ConfigError, PackError, RocketError};
use crate::logging::Log;

/// Default archive name, without extension.
pub const DEFAULT_BUNDLE_NAME: &str = "rocket-bundle";

/// Options for [`bundle`].
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Frame directory to include under `frame/`.
    pub frame_dir: Option<PathBuf>,
    /// Manifest file; defaults to a `rocket.config.*` next to the frame
    /// directory (or in the current directory without one).
    pub config: Option<PathBuf>,
    /// Directory referenced fuels are read from.
    pub fuel_dir: Option<PathBuf>,
    /// Directory the archive is written to.
    pub out_dir: PathBuf,
    /// Archive name without `.zip`.
    pub name: String,
    /// Build the archive but do not write it.
    pub dry_run: bool,
}

impl BundleOptions {
    /// Options writing `rocket-bundle.zip` into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            frame_dir: None,
            config: None,
            fuel_dir: None,
            out_dir: out_dir.into(),
            name: DEFAULT_BUNDLE_NAME.to_string(),
            dry_run: false,
        }
    }
}

/// A built pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    /// Archive path.
    pub path: PathBuf,
    /// Base64url SHA-256 of the archive.
    pub sha256: String,
    /// Number of archive entries.
    pub entries: usize,
    /// Fuels included.
    pub fuels: Vec<String>,
}

fn manifest_path(options: &BundleOptions) -> Result<PathBuf, ConfigError> {
    if let Some(config) = &options.config {
        return Ok(config.clone());
    }
    let dir = options
        .frame_dir
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    loader::find_manifest(dir)
}

fn read(path: &Path) -> Result<Vec<u8>, PackError> {
    std::fs::read(path).map_err(|source| PackError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Bundle a manifest, frame and referenced fuels into a zip archive.
///
/// The manifest is validated and stored as pretty JSON under
/// `rocket.config.json5` whatever its source format.
///
/// # Errors
///
/// Returns a config error for a missing or invalid manifest,
/// [`PackError::MissingFuelDir`] when fuels are referenced without a fuel
/// directory, [`ConfigError::FuelNotFound`] for a fuel that is missing or
/// names a path outside the fuel directory, or an I/O or archive error.
pub fn bundle(options: &BundleOptions, log: &dyn Log) -> Result<BundleReport, RocketError> {
    let config_path = manifest_path(options)?;
    log.info(&format!("manifest: {}", config_path.display()));
    let manifest = Manifest::load(&config_path)?;

    let mut entries = BTreeMap::new();
    let mut document = serde_json::to_string_pretty(&manifest.source).map_err(|e| ConfigError::Parse {
        path: config_path.clone(),
        format: "json",
        message: e.to_string(),
    })?;
    document.push('\n');
    entries.insert(MANIFEST_FILE.to_string(), document.into_bytes());

    if let Some(frame_dir) = &options.frame_dir {
        for relative in list_frame_files(frame_dir)? {
            let bytes = read(&frame_dir.join(&relative))?;
            entries.insert(format!("{FRAME_PREFIX}/{relative}"), bytes);
        }
    }

    let fuels = extract_referenced_fuels(&manifest.source);
    if !fuels.is_empty() {
        let fuel_dir = options.fuel_dir.as_ref().ok_or_else(|| PackError::MissingFuelDir {
            fuels: fuels.clone(),
        })?;
        let source = DirFuelSource::new(fuel_dir);
        for name in &fuels {
            let content = source.read_fuel(name)?;
            entries.insert(format!("{FUEL_PREFIX}/{name}"), content.into_bytes());
        }
    }
    log.debug(&format!("{} archive entries, {} fuels", entries.len(), fuels.len()));

    let archive = zip_entries(&entries)?;
    let sha256 = hash_bytes(&archive, HashEncoding::Base64Url);
    let path = options.out_dir.join(format!("{}.zip", options.name));

    if options.dry_run {
        log.dry_run(&format!("would write {} ({} bytes)", path.display(), archive.len()));
    } else {
        std::fs::create_dir_all(&options.out_dir).map_err(|source| PackError::Io {
            path: options.out_dir.clone(),
            source,
        })?;
        std::fs::write(&path, &archive).map_err(|source| PackError::Io {
            path: path.clone(),
            source,
        })?;
        log.info(&format!("bundled {} (sha256 {sha256})", path.display()));
    }

    Ok(BundleReport {
        path,
        sha256,
        entries: entries.len(),
        fuels,
    })
}
