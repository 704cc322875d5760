//! Command: print the SHA-256 of a file.
use anyhow::{Context as _, Result};

use crate::cli::HashOpts;
use crate::pack::hash_bytes;

/// Print the digest of `opts.file` to stdout.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
#[allow(clippy::print_stdout)]
pub fn run(opts: &HashOpts) -> Result<()> {
    let bytes = std::fs::read(&opts.file).with_context(|| format!("reading {}", opts.file.display()))?;
    println!("{}  {}", hash_bytes(&bytes, opts.encoding.into()), opts.file.display());
    Ok(())
}
