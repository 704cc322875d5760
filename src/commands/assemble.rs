//! Command: install a local frame directory.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::assemble::AssembleOptions;
use crate::cli::{AssembleOpts, GlobalOpts};
use crate::config::{DirFuelSource, FuelSource, Manifest, loader};
use crate::logging::Logger;
use crate::pipeline;

/// Directory holding the frame directory, or `.` for a bare name.
fn project_dir(frame_dir: &Path) -> &Path {
    frame_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Fuel directory: the explicit one, else a `fuel/` next to the frame.
fn fuel_dir(opts: &AssembleOpts) -> Option<PathBuf> {
    opts.fuel_dir.clone().or_else(|| {
        let sibling = project_dir(&opts.frame_dir).join("fuel");
        sibling.is_dir().then_some(sibling)
    })
}

/// Run the assemble command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be found or loaded, or if
/// resolution or assembly fails.
pub fn run(global: &GlobalOpts, opts: &AssembleOpts, log: &Logger) -> Result<()> {
    log.stage("Loading manifest");
    let manifest_path = match &opts.config {
        Some(path) => path.clone(),
        None => loader::find_manifest(project_dir(&opts.frame_dir))?,
    };
    let manifest = Manifest::load(&manifest_path)
        .with_context(|| format!("loading {}", manifest_path.display()))?;
    log.info(&format!(
        "{}: {} parameters, {} variables, {} excludes, {} builder files",
        manifest_path.display(),
        manifest.parameters.len(),
        manifest.variables.len(),
        manifest.excludes.len(),
        manifest.files_builder.len()
    ));
    pipeline::log_manifest_warnings(&manifest, log);

    let fuel = fuel_dir(opts).map(DirFuelSource::new);
    if let Some(source) = &fuel {
        log.debug(&format!("fuel: {}", source.root().display()));
    }

    let options = AssembleOptions {
        frame_dir: Some(opts.frame_dir.clone()),
        out_dir: opts.out.clone(),
        merge: opts.merge.into(),
        parallel: global.parallel,
        dry_run: global.dry_run,
    };
    let mut hooks = super::parameter_hooks(&opts.parameters)?;
    let prompter = super::prompter(&opts.parameters);

    pipeline::install(
        &manifest,
        fuel.as_ref().map(|f| f as &dyn FuelSource),
        &options,
        prompter.as_ref(),
        &mut hooks,
        log,
    )
    .context("assembling frame")?;

    log.print_summary();
    Ok(())
}
