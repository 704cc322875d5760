//! Command: describe a pack without installing it.
use anyhow::{Context as _, Result};

use crate::cli::InspectOpts;
use crate::config::extract_referenced_fuels;
use crate::logging::Logger;
use crate::pack::{self, archive};

/// Log whether `opts.source` is a config pack and what it declares.
///
/// # Errors
///
/// Returns an error if the source cannot be read or is not a zip archive.
pub fn run(opts: &InspectOpts, log: &Logger) -> Result<()> {
    let bytes = pack::read_source(&opts.source).with_context(|| format!("reading {}", opts.source))?;
    let entries = pack::unzip_entries(&bytes).context("reading archive")?;
    log.stage(&opts.source);
    log.info(&format!("{} entries", entries.len()));

    let manifest = match pack::extract_manifest(&bytes) {
        Ok(manifest) => manifest,
        Err(e) => {
            log.warn(&format!("not a config pack: {e}"));
            return Ok(());
        }
    };

    let frame_files = entries
        .keys()
        .filter(|name| name.starts_with(&format!("{}/", archive::FRAME_PREFIX)))
        .count();
    log.info(&format!("config pack with {frame_files} frame files"));

    if manifest.has_parameters() {
        let ids: Vec<&str> = manifest.parameters.iter().map(|p| p.id.as_str()).collect();
        log.info(&format!("parameters: {}", ids.join(", ")));
    } else {
        log.info("parameters: none");
    }
    log.info(&format!("variables: {}", manifest.variables.len()));
    log.info(&format!("excludes: {}", manifest.excludes.len()));
    log.info(&format!("builder files: {}", manifest.files_builder.len()));

    let fuels = extract_referenced_fuels(&manifest.source);
    if !fuels.is_empty() {
        log.info(&format!("fuels: {}", fuels.join(", ")));
    }
    Ok(())
}
