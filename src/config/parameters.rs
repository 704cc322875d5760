//! Parameter resolution.
use std::collections::HashSet;

use super::resolvable::{ParamValue, ParameterEnv, Resolvable};
use super::{Parameter, ParameterResolver};
use crate::error::ConfigError;
use crate::hooks::{HookBus, ParameterState};
use crate::logging::Log;
use crate::prompt::{PromptError, Prompter};

/// Resolve every parameter in declaration order.
///
/// For each parameter, `on_parameter` listeners run first; if they insert
/// the parameter's id into the environment its own resolver is skipped.
/// Otherwise prompt parameters ask `prompter` and expression parameters
/// evaluate against the parameters resolved before them. An expression that
/// evaluates to an empty string is stored as `false`.
///
/// # Errors
///
/// Returns [`ConfigError::UnresolvedReference`] if an expression names a
/// parameter declared later, [`ConfigError::UserCancelled`] if a prompt is
/// dismissed, or any error raised by a hook or the evaluator.
pub fn resolve_parameters(
    parameters: &[Parameter],
    prompter: &dyn Prompter,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<ParameterEnv, ConfigError> {
    let declared: HashSet<&str> = parameters.iter().map(|p| p.id.as_str()).collect();
    let mut env = ParameterEnv::new();

    for parameter in parameters {
        hooks.emit_parameter(&mut ParameterState {
            parameter,
            resolved: &mut env,
        })?;
        if env.contains_key(&parameter.id) {
            log.debug(&format!("parameter {} pre-seeded by hook", parameter.id));
            continue;
        }

        let value = match &parameter.resolver {
            ParameterResolver::Prompt(request) => {
                prompter.prompt(request).map_err(|e| match e {
                    PromptError::Cancelled => ConfigError::UserCancelled {
                        parameter: parameter.id.clone(),
                    },
                    PromptError::Failed(message) => ConfigError::Prompt {
                        parameter: parameter.id.clone(),
                        message,
                    },
                })?
            }
            ParameterResolver::Expression(node) => {
                check_references(node, &parameter.id, &declared, &env)?;
                let value = node.evaluate(&env, &ParamValue::Bool(true))?;
                if value.is_truthy() {
                    value
                } else {
                    ParamValue::Bool(false)
                }
            }
        };
        log.debug(&format!("parameter {} = {value}", parameter.id));
        env.insert(parameter.id.clone(), value);
    }

    Ok(env)
}

/// Fail if `node` names a declared parameter that is not in `env` yet.
///
/// # Errors
///
/// Returns [`ConfigError::UnresolvedReference`] for the first such reference.
pub fn check_references(
    node: &Resolvable,
    owner: &str,
    declared: &HashSet<&str>,
    env: &ParameterEnv,
) -> Result<(), ConfigError> {
    match node
        .literal_texts()
        .into_iter()
        .find(|text| declared.contains(text) && !env.contains_key(*text))
    {
        Some(reference) => Err(ConfigError::UnresolvedReference {
            parameter: owner.to_string(),
            reference: reference.to_string(),
        }),
        None => Ok(()),
    }
}
