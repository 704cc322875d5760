//! Config resolution: variables, excludes and file-builder entries.
use std::collections::{BTreeMap, HashSet};

use super::parameters::check_references;
use super::resolvable::{ParamValue, ParameterEnv, Resolvable};
use super::{Manifest, Resolver};
use crate::error::ConfigError;
use crate::hooks::{ExcludeState, FileBuilderState, HookBus, VariableState};
use crate::logging::Log;

/// A file generated from a file-builder entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltFile {
    /// Output path relative to the output directory.
    pub path: String,
    /// File content.
    pub content: String,
}

/// Everything assembly needs from a manifest, fully resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    /// Variable token to substituted value.
    pub variables: BTreeMap<String, String>,
    /// Relative path to exclude flag.
    pub excludes: BTreeMap<String, bool>,
    /// Builder key to generated file.
    pub files_builder: BTreeMap<String, BuiltFile>,
}

impl ResolvedEnvironment {
    /// Return `true` if `path` is excluded.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excludes.get(path).copied().unwrap_or(false)
    }
}

/// Resolve the manifest's variables, excludes and file-builder entries
/// against a frozen parameter environment.
///
/// Each section is one pass over its entries in document order. Before an
/// entry is evaluated its hook runs; a listener that inserts the entry's key
/// pre-seeds it and the declared resolver is skipped. Resolved text that
/// equals a parameter id is replaced by that parameter's value, one hop only.
///
/// # Errors
///
/// Returns the first evaluation, reference or hook error. No partial
/// environment is returned.
pub fn resolve_config(
    manifest: &Manifest,
    parameters: &ParameterEnv,
    hooks: &mut HookBus,
    log: &dyn Log,
) -> Result<ResolvedEnvironment, ConfigError> {
    let declared: HashSet<&str> = manifest.parameters.iter().map(|p| p.id.as_str()).collect();
    let evaluate = |node: &Resolvable, owner: &str| -> Result<ParamValue, ConfigError> {
        check_references(node, owner, &declared, parameters)?;
        node.evaluate(parameters, &ParamValue::Bool(true))
    };

    let mut variables = BTreeMap::new();
    for (name, resolver) in &manifest.variables {
        hooks.emit_variable_resolve(&mut VariableState {
            name,
            resolver,
            resolved: &mut variables,
        })?;
        let value = match variables.remove(name) {
            Some(seeded) => seeded,
            None => match resolver {
                Resolver::Literal(text) => text.clone(),
                Resolver::Expression(node) => {
                    let value = evaluate(node, name)?;
                    if value.is_truthy() { value.to_string() } else { String::new() }
                }
            },
        };
        variables.insert(name.clone(), inject_parameter(value, parameters));
    }

    let mut excludes = BTreeMap::new();
    for (path, resolver) in &manifest.excludes {
        hooks.emit_exclude_resolve(&mut ExcludeState {
            path,
            resolver,
            resolved: &mut excludes,
        })?;
        if excludes.contains_key(path) {
            continue;
        }
        let excluded = match resolver {
            Resolver::Literal(flag) => *flag,
            Resolver::Expression(node) => evaluate(node, path)?.is_truthy(),
        };
        excludes.insert(path.clone(), excluded);
    }

    let mut files_builder = BTreeMap::new();
    for (key, entry) in &manifest.files_builder {
        hooks.emit_file_builder_resolve(&mut FileBuilderState {
            key,
            entry,
            resolved: &mut files_builder,
        })?;
        let built = match files_builder.remove(key) {
            Some(seeded) => seeded,
            None => BuiltFile {
                path: entry.file_path.clone(),
                content: match &entry.content {
                    Resolver::Literal(text) => text.clone(),
                    Resolver::Expression(node) => {
                        let value = evaluate(node, key)?;
                        if value.is_truthy() { value.to_string() } else { String::new() }
                    }
                },
            },
        };
        files_builder.insert(
            key.clone(),
            BuiltFile {
                content: inject_parameter(built.content, parameters),
                ..built
            },
        );
    }

    log.debug(&format!(
        "resolved {} variables, {} excludes, {} builder files",
        variables.len(),
        excludes.len(),
        files_builder.len()
    ));

    Ok(ResolvedEnvironment {
        variables,
        excludes,
        files_builder,
    })
}

/// Replace `value` by the text parameter it names, one hop only.
///
/// The substituted value is not itself checked against parameter ids again.
/// Boolean parameters are not injected; the id stays as written.
fn inject_parameter(value: String, parameters: &ParameterEnv) -> String {
    match parameters.get(&value) {
        Some(ParamValue::Text(text)) => text.clone(),
        _ => value,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::hooks::{HookResult, RocketHooks};
    use crate::logging::NullLog;
    use serde_json::json;

    fn manifest(document: serde_json::Value) -> Manifest {
        Manifest::from_value(document).unwrap()
    }

    fn params(pairs: &[(&str, ParamValue)]) -> ParameterEnv {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn greeting_manifest() -> Manifest {
        manifest(json!({
            "parameters": [
                {"id": "$name", "resolver": {"operation": "prompt", "type": "text", "label": "Name?"}}
            ],
            "variablesResolver": {
                "{{GREETING}}": {"type": "match", "a": "$name", "b": "Ada", "result": "Hi Ada"}
            }
        }))
    }

    #[test]
    fn greeting_resolves_when_condition_holds() {
        let env = resolve_config(
            &greeting_manifest(),
            &params(&[("$name", "Ada".into())]),
            &mut HookBus::new(),
            &NullLog,
        )
        .unwrap();
        assert_eq!(env.variables["{{GREETING}}"], "Hi Ada");
    }

    #[test]
    fn greeting_is_empty_when_condition_fails() {
        let env = resolve_config(
            &greeting_manifest(),
            &params(&[("$name", "Bob".into())]),
            &mut HookBus::new(),
            &NullLog,
        )
        .unwrap();
        assert_eq!(env.variables["{{GREETING}}"], "");
    }

    #[test]
    fn bare_exclude_condition_means_true() {
        let m = manifest(json!({
            "excludesResolver": {
                "mac.conf": {"type": "not", "a": "$os", "b": "mac"},
                "always.txt": true,
                "never.txt": false
            }
        }));
        let env = resolve_config(&m, &params(&[("$os", "linux".into())]), &mut HookBus::new(), &NullLog)
            .unwrap();
        assert!(env.is_excluded("mac.conf"));
        assert!(env.is_excluded("always.txt"));
        assert!(!env.is_excluded("never.txt"));
        assert!(!env.is_excluded("unlisted"));
    }

    #[test]
    fn one_hop_parameter_injection_is_pinned() {
        // `$alias` holds another parameter id; the variable gets `$alias`'s
        // value and does not follow it further. `$flag` is boolean and is
        // left as the id.
        let m = manifest(json!({
            "variablesResolver": {"{{NAME}}": "$alias", "{{FLAG}}": "$flag"},
            "filesBuildResolver": {"who": {"filePath": "WHO", "content": "$alias"}}
        }));
        let p = params(&[
            ("$alias", "$name".into()),
            ("$name", "Ada".into()),
            ("$flag", true.into()),
        ]);
        let env = resolve_config(&m, &p, &mut HookBus::new(), &NullLog).unwrap();
        assert_eq!(env.variables["{{NAME}}"], "$name");
        assert_eq!(env.variables["{{FLAG}}"], "$flag");
        assert_eq!(env.files_builder["who"].content, "$name");
    }

    #[test]
    fn or_variable_falls_back() {
        let m = manifest(json!({
            "variablesResolver": {"{{EDITOR}}": {"type": "$or", "a": "$editor", "b": "vim"}}
        }));
        let env = resolve_config(&m, &params(&[("$editor", "".into())]), &mut HookBus::new(), &NullLog)
            .unwrap();
        assert_eq!(env.variables["{{EDITOR}}"], "vim");
    }

    #[test]
    fn builder_content_resolves() {
        let m = manifest(json!({
            "filesBuildResolver": {
                "readme": {"filePath": "README.md", "content": {"type": "format", "a": "$name", "b": "x", "result": "# {a}"}}
            }
        }));
        let env = resolve_config(&m, &params(&[("$name", "Ada".into())]), &mut HookBus::new(), &NullLog)
            .unwrap();
        assert_eq!(
            env.files_builder["readme"],
            BuiltFile {
                path: "README.md".to_string(),
                content: "# Ada".to_string()
            }
        );
    }

    struct SeedVariable;

    impl RocketHooks for SeedVariable {
        fn on_variable_resolve(&mut self, state: &mut VariableState<'_>) -> HookResult {
            if state.name == "{{GREETING}}" {
                state.resolved.insert(state.name.to_string(), "Seeded".to_string());
            }
            Ok(())
        }

        fn on_exclude_resolve(&mut self, state: &mut ExcludeState<'_>) -> HookResult {
            state.resolved.insert(state.path.to_string(), false);
            Ok(())
        }
    }

    #[test]
    fn hooks_pre_seed_entries() {
        let m = manifest(json!({
            "variablesResolver": {"{{GREETING}}": {"type": "match", "a": "$name", "b": "Ada", "result": "Hi"}},
            "excludesResolver": {"secret": true}
        }));
        let mut hooks = HookBus::new().with(SeedVariable);
        let env = resolve_config(&m, &params(&[("$name", "Bob".into())]), &mut hooks, &NullLog).unwrap();
        assert_eq!(env.variables["{{GREETING}}"], "Seeded");
        assert!(!env.is_excluded("secret"));
    }

    #[test]
    fn reference_to_missing_declared_parameter_fails() {
        let m = greeting_manifest();
        let err = resolve_config(&m, &ParameterEnv::new(), &mut HookBus::new(), &NullLog).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedReference { ref reference, .. } if reference == "$name"));
    }
}
