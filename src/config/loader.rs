//! Manifest file discovery and format dispatch.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Manifest file names recognised inside a frame's parent directory, in
/// lookup order.
pub const MANIFEST_CANDIDATES: &[&str] = &[
    "rocket.config.json5",
    "rocket.config.json",
    "rocket.config.yaml",
    "rocket.config.yml",
    "rocket.config.toml",
];

/// Find the first manifest candidate that exists in `dir`.
///
/// # Errors
///
/// Returns [`ConfigError::ManifestNotFound`] if none exists.
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ConfigError> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::ManifestNotFound {
            dir: dir.to_path_buf(),
        })
}

/// Load a manifest file as a plain nested document.
///
/// The format is chosen from the extension: `.json` is parsed as strict
/// JSON, `.json5` as JSON5, `.yaml`/`.yml` as YAML and `.toml` as TOML. Object key
/// order is preserved.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, &content)
}

/// Parse manifest text according to the extension of `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed content or an unknown extension.
pub fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let parse_error = |format: &'static str, message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        format,
        message,
    };

    match extension.as_str() {
        "json" => serde_json::from_str(content).map_err(|e| parse_error("json", e.to_string())),
        "json5" => json5::from_str(content).map_err(|e| parse_error("json5", e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(content).map_err(|e| parse_error("yaml", e.to_string()))
        }
        "toml" => toml::from_str(content).map_err(|e| parse_error("toml", e.to_string())),
        other => Err(parse_error(
            "unknown",
            format!("unsupported manifest extension '.{other}'"),
        )),
    }
}
