//! Domain-specific error types for config-rocket.
//!
//! Library modules return typed errors (e.g., [`ConfigError`], [`OutputError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! RocketError
//! ├── Config(ConfigError)     manifest loading, parameter/config resolution, fuel
//! ├── Assemble(AssembleError) frame walking, substitution
//! ├── Output(OutputError)     single-file write and merge
//! └── Pack(PackError)         archives, checksums, download, unpack driver
//! ```
//!
//! Any hook handler may abort an operation with a [`HookAbort`], which each
//! layer carries through its own `Hook` variant.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for config-rocket.
#[derive(Error, Debug)]
pub enum RocketError {
    /// Manifest or resolution error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Assembly error.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// File output error.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Pack handling error.
    #[error(transparent)]
    Pack(#[from] PackError),
}

/// Raised by a hook handler to abort the operation it observes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hook '{hook}' aborted: {reason}")]
pub struct HookAbort {
    /// Extension point that was running (e.g. `on_write`).
    pub hook: &'static str,
    /// Human-readable reason given by the handler.
    pub reason: String,
}

impl HookAbort {
    /// Create an abort for the given extension point.
    pub fn new(hook: &'static str, reason: impl Into<String>) -> Self {
        Self {
            hook,
            reason: reason.into(),
        }
    }
}

/// Errors from manifest loading, parameter resolution and config resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest document has the wrong shape.
    #[error("invalid manifest at `{at}`: {message}")]
    ManifestInvalid {
        /// Dotted location of the offending node, e.g. `parameters[1].resolver`.
        at: String,
        /// What is wrong with it.
        message: String,
    },

    /// No manifest file exists in the searched directory.
    #[error("no rocket.config manifest found in {}", .dir.display())]
    ManifestNotFound {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The manifest file could not be parsed in its declared format.
    #[error("failed to parse {format} manifest {}: {message}", .path.display())]
    Parse {
        /// Manifest file path.
        path: PathBuf,
        /// Format chosen from the extension.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// An expression references a declared parameter that is not resolved yet.
    #[error("'{parameter}' references parameter '{reference}' before it is resolved")]
    UnresolvedReference {
        /// Parameter, variable or file key whose expression holds the reference.
        parameter: String,
        /// The referenced parameter id.
        reference: String,
    },

    /// An operand has the wrong type for its operation.
    #[error("type mismatch in '{operation}': {message}")]
    TypeMismatch {
        /// Resolvable type being evaluated.
        operation: &'static str,
        /// Which operand was wrong and why.
        message: String,
    },

    /// The user cancelled a prompt.
    #[error("prompt for parameter '{parameter}' was cancelled")]
    UserCancelled {
        /// Parameter being prompted.
        parameter: String,
    },

    /// The prompt backend failed for a reason other than cancellation.
    #[error("prompt for parameter '{parameter}' failed: {message}")]
    Prompt {
        /// Parameter being prompted.
        parameter: String,
        /// Backend message.
        message: String,
    },

    /// A `fuel:<name>` reference could not be read.
    #[error("fuel '{name}' not found: {reason}")]
    FuelNotFound {
        /// Fuel name (without the `fuel:` prefix).
        name: String,
        /// Why it could not be read.
        reason: String,
    },

    /// An I/O error occurred while reading a manifest.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A hook aborted resolution.
    #[error(transparent)]
    Hook(#[from] HookAbort),
}

/// Errors from writing a single file through the merge engine.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Existing or incoming content is not valid for its merge format.
    #[error("cannot merge {}: malformed {format}: {message}", .path.display())]
    MergeParseError {
        /// Destination path.
        path: PathBuf,
        /// `json` or `yaml`.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// Data for a structured merge is not text.
    #[error("cannot merge {}: {format} merge requires UTF-8 text data", .path.display())]
    InvalidMergeInput {
        /// Destination path.
        path: PathBuf,
        /// `json` or `yaml`.
        format: &'static str,
    },

    /// A custom merge type was requested but no hook produced a result.
    #[error("custom merge for {} produced no result", .path.display())]
    MissingCustomMergeResult {
        /// Destination path.
        path: PathBuf,
    },

    /// The merged document could not be serialized.
    #[error("failed to serialize merged {format} for {}: {message}", .path.display())]
    Serialize {
        /// Destination path.
        path: PathBuf,
        /// `json` or `yaml`.
        format: &'static str,
        /// Serializer message.
        message: String,
    },

    /// An I/O error occurred while writing.
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A hook aborted the write.
    #[error(transparent)]
    Hook(#[from] HookAbort),
}

/// Errors from assembling a frame into an output directory.
#[derive(Error, Debug)]
pub enum AssembleError {
    /// Variable substitution kept changing the content.
    #[error("variable substitution in '{path}' did not converge after {passes} passes")]
    SubstitutionDidNotConverge {
        /// Relative path of the file being substituted.
        path: String,
        /// Number of passes attempted.
        passes: usize,
    },

    /// An I/O error occurred while walking or reading the frame.
    #[error("IO error reading frame {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A destination path is absolute or leaves the output directory.
    #[error("output path '{path}' escapes the output directory")]
    UnsafePath {
        /// Offending relative path.
        path: String,
    },

    /// Writing an assembled file failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// A hook aborted assembly.
    #[error(transparent)]
    Hook(#[from] HookAbort),
}

/// Errors from bundling, downloading, verifying and unpacking config packs.
#[derive(Error, Debug)]
pub enum PackError {
    /// The archive has no manifest entry.
    #[error("archive is not a config pack (missing rocket.config.json5)")]
    NotAConfigPack,

    /// The archive hash does not match the expected checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Caller-supplied checksum.
        expected: String,
        /// Computed checksum, in the same encoding as `expected`.
        actual: String,
    },

    /// Download failed.
    #[error("failed to download {url}: {message}")]
    Download {
        /// Requested URL.
        url: String,
        /// Transport or status message.
        message: String,
    },

    /// Zip codec failure.
    #[error("archive error: {message}")]
    Archive {
        /// Codec message.
        message: String,
    },

    /// An archive entry would escape the extraction root.
    #[error("archive entry '{name}' escapes the extraction directory")]
    UnsafeEntry {
        /// Raw entry name.
        name: String,
    },

    /// The manifest references fuels but no fuel directory was given.
    #[error("manifest references fuels ({}) but no fuel directory was given", .fuels.join(", "))]
    MissingFuelDir {
        /// Referenced fuel names.
        fuels: Vec<String>,
    },

    /// The user declined to continue.
    #[error("unpack aborted")]
    Aborted,

    /// A file selection pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob {
        /// Pattern as given.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// No file matched the include patterns.
    #[error("no files matched the include patterns")]
    NothingToArchive,

    /// An I/O error occurred.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A hook aborted the operation.
    #[error(transparent)]
    Hook(#[from] HookAbort),
}

impl From<zip::result::ZipError> for PackError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive {
            message: e.to_string(),
        }
    }
}
