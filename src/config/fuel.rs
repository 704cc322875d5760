//! Fuel: external content referenced as `fuel:<name>`.
//!
//! A resolved variable or builder file whose whole value is `fuel:<name>` is
//! replaced by the content of the named fuel. Fuel content is inserted as-is
//! and never scanned for further references.
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use super::resolve::BuiltFile;
use crate::error::ConfigError;

/// Prefix marking a fuel reference.
pub const FUEL_PREFIX: &str = "fuel:";

/// Source of named fuel content.
pub trait FuelSource {
    /// Read the fuel called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FuelNotFound`] if no such fuel exists.
    fn read_fuel(&self, name: &str) -> Result<String, ConfigError>;
}

/// Fuel files stored under one root directory.
#[derive(Debug, Clone)]
pub struct DirFuelSource {
    root: PathBuf,
}

impl DirFuelSource {
    /// Serve fuel from files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory fuel is read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn not_found(name: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::FuelNotFound {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl FuelSource for DirFuelSource {
    fn read_fuel(&self, name: &str) -> Result<String, ConfigError> {
        let relative = Path::new(name);
        if name.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Self::not_found(name, "name must be a relative path inside the fuel directory"));
        }

        let path = self.root.join(relative);
        let canonical = dunce::canonicalize(&path).map_err(|e| Self::not_found(name, e.to_string()))?;
        let root = dunce::canonicalize(&self.root).map_err(|e| Self::not_found(name, e.to_string()))?;
        if !canonical.starts_with(&root) {
            return Err(Self::not_found(name, "resolves outside the fuel directory"));
        }

        std::fs::read_to_string(&canonical).map_err(|e| Self::not_found(name, e.to_string()))
    }
}

impl FuelSource for BTreeMap<String, String> {
    fn read_fuel(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name).cloned().ok_or_else(|| ConfigError::FuelNotFound {
            name: name.to_string(),
            reason: "not in the fuel map".to_string(),
        })
    }
}

fn fuel_name(value: &str) -> Option<&str> {
    value.strip_prefix(FUEL_PREFIX)
}

fn refuel(value: &str, source: &dyn FuelSource) -> Result<String, ConfigError> {
    match fuel_name(value) {
        Some(name) => source.read_fuel(name),
        None => Ok(value.to_string()),
    }
}

/// Return a copy of `resolved` with every `fuel:<name>` value replaced by
/// the fuel's content. The input is left untouched.
///
/// # Errors
///
/// Returns [`ConfigError::FuelNotFound`] for the first missing fuel.
pub fn supply_fuel(
    resolved: &BTreeMap<String, String>,
    source: &dyn FuelSource,
) -> Result<BTreeMap<String, String>, ConfigError> {
    resolved
        .iter()
        .map(|(key, value)| Ok((key.clone(), refuel(value, source)?)))
        .collect()
}

/// [`supply_fuel`] for file-builder content.
///
/// # Errors
///
/// Returns [`ConfigError::FuelNotFound`] for the first missing fuel.
pub fn supply_fuel_to_files_builder(
    resolved: &BTreeMap<String, BuiltFile>,
    source: &dyn FuelSource,
) -> Result<BTreeMap<String, BuiltFile>, ConfigError> {
    resolved
        .iter()
        .map(|(key, file)| {
            Ok((
                key.clone(),
                BuiltFile {
                    path: file.path.clone(),
                    content: refuel(&file.content, source)?,
                },
            ))
        })
        .collect()
}

/// Names of every fuel referenced anywhere in a manifest document, sorted
/// and de-duplicated.
#[must_use]
pub fn extract_referenced_fuels(document: &serde_json::Value) -> Vec<String> {
    fn walk<'a>(value: &'a serde_json::Value, out: &mut BTreeSet<&'a str>) {
        match value {
            serde_json::Value::String(s) => {
                if let Some(name) = fuel_name(s) {
                    out.insert(name);
                }
            }
            serde_json::Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            serde_json::Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut names = BTreeSet::new();
    walk(document, &mut names);
    names.into_iter().map(String::from).collect()
}
