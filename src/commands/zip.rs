//! Command: zip files matching glob patterns.
use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, ZipOpts};
use crate::config::ParamValue;
use crate::logging::Logger;
use crate::pack;
use crate::prompt::{DefaultsPrompter, PromptError, PromptKind, PromptRequest, Prompter, TerminalPrompter};

/// Ask whether to zip `files`. A cancelled prompt counts as "no".
fn confirm(prompter: &dyn Prompter, files: &[String]) -> Result<bool> {
    let request = PromptRequest {
        kind: PromptKind::Confirm,
        label: format!("Found {} files, zip them? {}", files.len(), files.join(", ")),
        default: Some(ParamValue::Bool(true)),
    };
    match prompter.prompt(&request) {
        Ok(answer) => Ok(answer.is_truthy()),
        Err(PromptError::Cancelled) => Ok(false),
        Err(e) => Err(e).context("asking for confirmation"),
    }
}

/// Run the zip command.
///
/// # Errors
///
/// Returns an error if a pattern is invalid, nothing matches, or the archive
/// cannot be written.
pub fn run(global: &GlobalOpts, opts: &ZipOpts, log: &Logger) -> Result<()> {
    log.stage("Zipping");
    let files = pack::select_files(&opts.dir, &opts.include, &opts.exclude).context("selecting files")?;
    log.info(&format!("{} files matched", files.len()));

    let prompter: Box<dyn Prompter> = if opts.yes {
        Box::new(DefaultsPrompter)
    } else {
        Box::new(TerminalPrompter)
    };
    if !confirm(prompter.as_ref(), &files)? {
        log.warn("zipping aborted");
        return Ok(());
    }

    let report = pack::archive_files(&opts.dir, &files, &opts.output, global.dry_run, log)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    log.info(&format!("sha256: {}", report.sha256));
    Ok(())
}
