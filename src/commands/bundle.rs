//! Command: bundle a frame directory into a pack.
use anyhow::{Context as _, Result};

use crate::cli::{BundleOpts, GlobalOpts};
use crate::logging::Logger;
use crate::pack::{self, BundleOptions};

/// Run the bundle command.
///
/// # Errors
///
/// Returns an error if the manifest is invalid, a referenced file cannot be
/// read, or the archive cannot be written.
pub fn run(global: &GlobalOpts, opts: &BundleOpts, log: &Logger) -> Result<()> {
    log.stage("Bundling");
    let options = BundleOptions {
        frame_dir: opts.frame_dir.clone(),
        config: opts.config.clone(),
        fuel_dir: opts.fuel_dir.clone(),
        out_dir: opts.out_dir.clone(),
        name: opts.name.clone(),
        dry_run: global.dry_run,
    };
    let report = pack::bundle(&options, log).context("bundling config pack")?;
    log.info(&format!(
        "{} entries, {} fuels",
        report.entries,
        report.fuels.len()
    ));
    log.info(&format!("path: {}", report.path.display()));
    log.info(&format!("sha256: {}", report.sha256));
    Ok(())
}
