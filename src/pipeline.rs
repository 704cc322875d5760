//! The full install sequence shared by `assemble` and `unpack`: parameters,
//! config, fuel, then assembly.
use std::collections::BTreeMap;

use crate::assemble::{AssembleOptions, AssembleReport, assemble};
use crate::config::{
    FuelSource, Manifest, ParameterEnv, ResolvedEnvironment, resolve_config, resolve_parameters,
    supply_fuel, supply_fuel_to_files_builder, validation,
};
use crate::error::RocketError;
use crate::hooks::HookBus;
use crate::logging::Log;
use crate::prompt::Prompter;

/// Everything an install produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Resolved parameters.
    pub parameters: ParameterEnv,
    /// Resolved environment after fuel was supplied.
    pub environment: ResolvedEnvironment,
    /// Per-file assembly outcomes.
    pub assembly: AssembleReport,
}

/// Log every non-fatal manifest warning.
pub fn log_manifest_warnings(manifest: &Manifest, log: &dyn Log) {
    for warning in validation::collect_warnings(manifest) {
        log.warn(&format!("manifest {}: {}", warning.at, warning.message));
    }
}

/// Resolve `manifest` and assemble it with `options`.
///
/// Without a fuel source every `fuel:` reference fails with
/// [`ConfigError::FuelNotFound`](crate::error::ConfigError::FuelNotFound).
///
/// # Errors
///
/// Returns the first resolution, fuel, hook or assembly error.
pub fn install(
    manifest: &Manifest,
    fuel: Option<&dyn FuelSource>,
    options: &AssembleOptions,
    prompter: &dyn Prompter,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<InstallReport, RocketError> {
    log.stage("Resolving parameters");
    let parameters = resolve_parameters(&manifest.parameters, prompter, hooks, log)?;
    log.info(&format!("{} parameters resolved", parameters.len()));

    log.stage("Resolving config");
    let resolved = resolve_config(manifest, &parameters, hooks, log)?;

    let no_fuel = BTreeMap::<String, String>::new();
    let source = fuel.unwrap_or(&no_fuel);
    let environment = ResolvedEnvironment {
        variables: supply_fuel(&resolved.variables, source)?,
        files_builder: supply_fuel_to_files_builder(&resolved.files_builder, source)?,
        excludes: resolved.excludes,
    };

    log.stage("Assembling");
    let assembly = assemble(&environment, options, hooks, log)?;
    log.info(&format!(
        "{} files processed into {}",
        assembly.files.len(),
        options.out_dir.display()
    ));

    Ok(InstallReport {
        parameters,
        environment,
        assembly,
    })
}
