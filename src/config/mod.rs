//! Manifest model, loading, and resolution.
//!
//! A manifest declares parameters (prompted or computed), variables that are
//! substituted into frame files, exclude rules, and dynamically built files.
//! Loading validates the whole document up front; resolution then runs in
//! three steps:
//!
//! 1. [`resolve_parameters`] builds the [`ParameterEnv`] in declaration order.
//! 2. [`resolve_config`] turns variables, excludes and file-builder entries
//!    into a [`ResolvedEnvironment`].
//! 3. [`supply_fuel`] / [`supply_fuel_to_files_builder`] replace `fuel:<name>`
//!    values with external content.
pub mod fuel;
pub mod loader;
pub mod parameters;
pub mod resolvable;
pub mod resolve;
pub mod validation;

use std::path::Path;

use crate::error::ConfigError;
use crate::prompt::PromptRequest;

pub use fuel::{
    DirFuelSource, FuelSource, extract_referenced_fuels, supply_fuel,
    supply_fuel_to_files_builder,
};
pub use parameters::resolve_parameters;
pub use resolvable::{Condition, ConditionResult, Operand, ParamValue, ParameterEnv, Resolvable};
pub use resolve::{BuiltFile, ResolvedEnvironment, resolve_config};

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Unique id; expressions refer to the parameter by this string.
    pub id: String,
    /// How the value is obtained.
    pub resolver: ParameterResolver,
}

/// How a parameter obtains its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterResolver {
    /// Ask the user.
    Prompt(PromptRequest),
    /// Evaluate an expression over earlier parameters.
    Expression(Resolvable),
}

/// A literal value or an expression producing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver<T> {
    /// Used as-is.
    Literal(T),
    /// Evaluated against the parameter environment.
    Expression(Resolvable),
}

/// A file produced from the manifest rather than from the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuilderEntry {
    /// Output path relative to the output directory.
    pub file_path: String,
    /// File content.
    pub content: Resolver<String>,
}

/// A validated manifest.
///
/// Entries keep document order. The parsed document is kept alongside so a
/// pack can be re-bundled without re-serializing the typed model.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Parameters in declaration (and resolution) order.
    pub parameters: Vec<Parameter>,
    /// Variable token to value.
    pub variables: Vec<(String, Resolver<String>)>,
    /// Relative path to exclude flag.
    pub excludes: Vec<(String, Resolver<bool>)>,
    /// Builder key to generated file.
    pub files_builder: Vec<(String, FileBuilderEntry)>,
    /// The document this manifest was parsed from.
    pub source: serde_json::Value,
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed in the format
    /// implied by its extension, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = loader::load_document(path)?;
        Self::from_value(document)
    }

    /// Validate an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ManifestInvalid`] describing the first problem found.
    pub fn from_value(document: serde_json::Value) -> Result<Self, ConfigError> {
        validation::parse_manifest(document)
    }

    /// Return `true` if any parameter is declared.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Look up a parameter by id.
    #[must_use]
    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}
