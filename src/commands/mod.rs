//! Top-level subcommand orchestration.
pub mod assemble;
pub mod bundle;
pub mod completions;
pub mod hash;
pub mod inspect;
pub mod unpack;
pub mod version;
pub mod zip;

use anyhow::Result;

use crate::cli::ParameterOpts;
use crate::hooks::{HookBus, PresetParameters};
use crate::prompt::{DefaultsPrompter, Prompter, TerminalPrompter};

/// Build the hook bus for `--param` answers.
///
/// # Errors
///
/// Returns an error if an assignment is not `ID=VALUE`.
pub fn parameter_hooks(opts: &ParameterOpts) -> Result<HookBus> {
    let presets = PresetParameters::from_assignments(&opts.params).map_err(anyhow::Error::msg)?;
    let mut hooks = HookBus::new();
    if !presets.is_empty() {
        hooks.register(presets);
    }
    Ok(hooks)
}

/// Terminal prompts, or declared defaults with `--yes`.
#[must_use]
pub fn prompter(opts: &ParameterOpts) -> Box<dyn Prompter> {
    if opts.yes {
        Box::new(DefaultsPrompter)
    } else {
        Box::new(TerminalPrompter)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn opts(params: &[&str], yes: bool) -> ParameterOpts {
        ParameterOpts {
            params: params.iter().map(ToString::to_string).collect(),
            yes,
        }
    }

    #[test]
    fn no_params_means_empty_bus() {
        assert!(parameter_hooks(&opts(&[], false)).unwrap().is_empty());
    }

    #[test]
    fn params_register_one_listener() {
        assert_eq!(parameter_hooks(&opts(&["$a=1", "$b=2"], false)).unwrap().len(), 1);
    }

    #[test]
    fn malformed_param_is_an_error() {
        let err = parameter_hooks(&opts(&["oops"], false)).unwrap_err();
        assert!(err.to_string().contains("ID=VALUE"));
    }
}
