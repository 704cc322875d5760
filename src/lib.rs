//! Config pack engine.
//!
//! A config pack is a zip archive holding a manifest, a frame of template
//! files, and optional fuel files. Installing a pack resolves the manifest's
//! parameters (prompting where needed), evaluates variables, exclude rules
//! and built files, substitutes variables into the frame, and writes the
//! result into an output directory, merging JSON and YAML with what is
//! already there.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: manifest loading, validation, the resolvable DSL and
//!   parameter/config resolution
//! - **[`assemble`]**: frame selection, variable substitution and writing
//! - **[`output`]**: per-file write and merge
//! - **[`hooks`]**: the synchronous hook bus that can observe or rewrite
//!   every stage
//! - **[`pack`]**: archives, checksums, download, bundling and unpacking
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod assemble;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod output;
pub mod pack;
pub mod pipeline;
pub mod prompt;
