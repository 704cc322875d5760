//! Command: download or read a pack and install it.
use anyhow::{Context as _, Result};

use crate::assemble::AssembleOptions;
use crate::cli::{GlobalOpts, UnpackOpts};
use crate::logging::{FileOutcome, Logger};
use crate::pack::{self, UnpackOptions, UnpackOutcome, fetch, unpack::staging_dir};

/// Run the unpack command.
///
/// # Errors
///
/// Returns an error if the pack cannot be read, verified, extracted or
/// installed.
pub fn run(global: &GlobalOpts, opts: &UnpackOpts, log: &Logger) -> Result<()> {
    log.stage("Reading pack");
    if fetch::is_url(&opts.source) {
        log.info(&format!("downloading {}", opts.source));
    }
    let bytes = pack::read_source(&opts.source).with_context(|| format!("reading {}", opts.source))?;
    log.debug(&format!("{} bytes", bytes.len()));

    let staging = staging_dir().context("creating staging directory")?;
    let cleanup = staging.path().to_path_buf();
    // Only one handler per process; a second run keeps the first.
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = std::fs::remove_dir_all(&cleanup);
        std::process::exit(130);
    }) {
        log.debug(&format!("Ctrl-C cleanup not installed: {e}"));
    }

    let options = UnpackOptions {
        sha256: opts.sha256.clone(),
        non_assembly: opts.non_assembly.into(),
        assemble: AssembleOptions {
            frame_dir: None,
            out_dir: opts.out.clone(),
            merge: opts.merge.into(),
            parallel: global.parallel,
            dry_run: global.dry_run,
        },
    };
    let mut hooks = super::parameter_hooks(&opts.parameters)?;
    let prompter = super::prompter(&opts.parameters);

    let outcome = pack::unpack(
        &bytes,
        staging.path(),
        &options,
        prompter.as_ref(),
        &mut hooks,
        log,
    );
    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        log.warn(&format!("could not remove {}: {e}", staging_path.display()));
    }

    match outcome.with_context(|| format!("unpacking {}", opts.source))? {
        UnpackOutcome::Assembled(report) => log.info(&format!(
            "installed into {} ({} written, {} merged)",
            opts.out.display(),
            report.assembly.count(FileOutcome::Written),
            report.assembly.count(FileOutcome::Merged),
        )),
        UnpackOutcome::Extracted { files } => log.info(&format!(
            "extracted {files} files into {} without assembly",
            opts.out.display()
        )),
    }

    log.print_summary();
    Ok(())
}
