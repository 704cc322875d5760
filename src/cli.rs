use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::MergeMode;
use crate::pack::{HashEncoding, NonAssemblyBehavior};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "config-rocket",
    about = "Bundle, share and install config packs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Resolve and render everything but write nothing
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Render files sequentially instead of in parallel
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download or read a config pack and install it
    Unpack(UnpackOpts),
    /// Install a local frame directory without bundling it
    Assemble(AssembleOpts),
    /// Bundle a frame directory into a config pack
    Bundle(BundleOpts),
    /// Print the SHA-256 of a file
    Hash(HashOpts),
    /// Show what a config pack contains
    Inspect(InspectOpts),
    /// Zip files matching glob patterns
    Zip(ZipOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Merge policy on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeArg {
    /// Always overwrite
    Off,
    /// Merge every file, concatenating text
    Concat,
    /// Deep-merge JSON and YAML, overwrite the rest
    Deep,
}

impl From<MergeArg> for MergeMode {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Off => Self::Off,
            MergeArg::Concat => Self::Concat,
            MergeArg::Deep => Self::Deep,
        }
    }
}

/// Handling of archives without a manifest on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonAssemblyArg {
    /// Ask before extracting
    Prompt,
    /// Extract as-is
    Continue,
    /// Fail
    Abort,
}

impl From<NonAssemblyArg> for NonAssemblyBehavior {
    fn from(arg: NonAssemblyArg) -> Self {
        match arg {
            NonAssemblyArg::Prompt => Self::Prompt,
            NonAssemblyArg::Continue => Self::Continue,
            NonAssemblyArg::Abort => Self::Abort,
        }
    }
}

/// Digest encoding on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingArg {
    /// Unpadded URL-safe base64
    Base64url,
    /// Lower-case hex
    Hex,
}

impl From<EncodingArg> for HashEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Base64url => Self::Base64Url,
            EncodingArg::Hex => Self::Hex,
        }
    }
}

/// Parameter answers shared by `unpack` and `assemble`.
#[derive(Parser, Debug, Clone)]
pub struct ParameterOpts {
    /// Answer a parameter up front (repeatable), e.g. `--param '$name=Ada'`
    #[arg(long = "param", value_name = "ID=VALUE")]
    pub params: Vec<String>,

    /// Never prompt; use declared defaults
    #[arg(short, long)]
    pub yes: bool,
}

/// Options for the `unpack` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UnpackOpts {
    /// URL or path of the pack archive
    pub source: String,

    /// Expected SHA-256 of the archive (base64url or hex)
    #[arg(long)]
    pub sha256: Option<String>,

    /// What to do when the archive is not a config pack
    #[arg(long, value_enum, default_value = "prompt")]
    pub non_assembly: NonAssemblyArg,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Merge policy for existing files
    #[arg(long, value_enum, default_value = "deep")]
    pub merge: MergeArg,

    #[command(flatten)]
    pub parameters: ParameterOpts,
}

/// Options for the `assemble` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AssembleOpts {
    /// Frame directory
    #[arg(long)]
    pub frame_dir: PathBuf,

    /// Manifest file (defaults to `rocket.config.*` next to the frame directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fuel directory
    #[arg(long)]
    pub fuel_dir: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Merge policy for existing files
    #[arg(long, value_enum, default_value = "deep")]
    pub merge: MergeArg,

    #[command(flatten)]
    pub parameters: ParameterOpts,
}

/// Options for the `bundle` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BundleOpts {
    /// Frame directory
    #[arg(long)]
    pub frame_dir: Option<PathBuf>,

    /// Manifest file (defaults to `rocket.config.*` next to the frame directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fuel directory
    #[arg(long)]
    pub fuel_dir: Option<PathBuf>,

    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Archive name without `.zip`
    #[arg(long, default_value = crate::pack::bundle::DEFAULT_BUNDLE_NAME)]
    pub name: String,
}

/// Options for the `hash` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct HashOpts {
    /// File to hash
    pub file: PathBuf,

    /// Digest encoding
    #[arg(long, value_enum, default_value = "base64url")]
    pub encoding: EncodingArg,
}

/// Options for the `inspect` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InspectOpts {
    /// URL or path of the pack archive
    pub source: String,
}

/// Options for the `zip` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ZipOpts {
    /// Glob pattern of files to include (repeatable), e.g. `files/*.md`
    #[arg(short, long, required = true)]
    pub include: Vec<String>,

    /// Glob pattern of files to exclude (repeatable), e.g. `.env*`
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,

    /// Directory patterns are matched against
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Output file
    #[arg(short, long, default_value = crate::pack::selection::DEFAULT_ARCHIVE_NAME)]
    pub output: PathBuf,

    /// Do not ask before zipping
    #[arg(short, long)]
    pub yes: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    pub shell: clap_complete::Shell,
}
