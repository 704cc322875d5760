//! Structural validation of manifest documents.
//!
//! [`parse_manifest`] walks the whole document before any resolution starts
//! and fails on the first structural problem, naming its location
//! (`parameters[1].resolver.resolvable.a`). [`collect_warnings`] reports
//! suspicious but legal content.
use std::collections::HashSet;

use serde_json::{Map, Value};

use super::resolvable::{Condition, ConditionResult, Operand, ParamValue, Resolvable};
use super::{FileBuilderEntry, Manifest, Parameter, ParameterResolver, Resolver};
use crate::error::ConfigError;
use crate::prompt::{PromptKind, PromptRequest};

/// Root keys understood by the manifest parser.
const ROOT_KEYS: &[&str] = &[
    "parameters",
    "variablesResolver",
    "filesBuildResolver",
    "excludesResolver",
];

/// A non-fatal problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Location of the offending node.
    pub at: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            at: at.into(),
            message: message.into(),
        }
    }
}

fn invalid(at: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ManifestInvalid {
        at: at.to_string(),
        message: message.into(),
    }
}

/// Validate `document` and build the typed manifest.
///
/// # Errors
///
/// Returns [`ConfigError::ManifestInvalid`] for the first structural problem.
pub fn parse_manifest(document: Value) -> Result<Manifest, ConfigError> {
    let root = document
        .as_object()
        .ok_or_else(|| invalid("$", "manifest root must be an object"))?;

    let parameters = parse_parameters(root.get("parameters"))?;
    let variables = parse_entries(root.get("variablesResolver"), "variablesResolver", parse_variable)?;
    let excludes = parse_entries(root.get("excludesResolver"), "excludesResolver", parse_exclude)?;
    let files_builder = parse_entries(
        root.get("filesBuildResolver"),
        "filesBuildResolver",
        parse_file_builder,
    )?;

    Ok(Manifest {
        parameters,
        variables,
        excludes,
        files_builder,
        source: document,
    })
}

/// Report legal but suspicious content: unknown root keys and builder
/// entries that write to the same output path.
#[must_use]
pub fn collect_warnings(manifest: &Manifest) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    if let Some(root) = manifest.source.as_object() {
        for key in root.keys().filter(|k| !ROOT_KEYS.contains(&k.as_str())) {
            warnings.push(ValidationWarning::new(key.as_str(), "unknown key is ignored"));
        }
    }

    let mut seen = HashSet::new();
    for (key, entry) in &manifest.files_builder {
        if !seen.insert(entry.file_path.as_str()) {
            warnings.push(ValidationWarning::new(
                format!("filesBuildResolver.{key}.filePath"),
                format!("'{}' is also built by an earlier entry; the later one wins", entry.file_path),
            ));
        }
    }
    warnings
}

fn parse_parameters(value: Option<&Value>) -> Result<Vec<Parameter>, ConfigError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid("parameters", "must be an array")),
    };

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let at = format!("parameters[{index}]");
        let obj = item
            .as_object()
            .ok_or_else(|| invalid(&at, "must be an object"))?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid(&format!("{at}.id"), "must be a non-empty string"))?;
        if !seen.insert(id) {
            return Err(invalid(
                &format!("{at}.id"),
                format!("duplicate parameter id '{id}'"),
            ));
        }
        let resolver = parse_parameter_resolver(obj.get("resolver"), &format!("{at}.resolver"))?;
        parameters.push(Parameter {
            id: id.to_string(),
            resolver,
        });
    }
    Ok(parameters)
}

fn parse_parameter_resolver(value: Option<&Value>, at: &str) -> Result<ParameterResolver, ConfigError> {
    let obj = value
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(at, "must be an object"))?;
    match obj.get("operation").and_then(Value::as_str) {
        Some("prompt") => parse_prompt(obj, at).map(ParameterResolver::Prompt),
        Some("resolvable") => parse_resolvable(
            obj.get("resolvable")
                .ok_or_else(|| invalid(&format!("{at}.resolvable"), "is required"))?,
            &format!("{at}.resolvable"),
        )
        .map(ParameterResolver::Expression),
        Some(other) => Err(invalid(
            &format!("{at}.operation"),
            format!("unknown operation '{other}', expected 'prompt' or 'resolvable'"),
        )),
        None => Err(invalid(&format!("{at}.operation"), "must be a string")),
    }
}

/// Prompt fields sit directly on the resolver object next to `operation`.
fn parse_prompt(obj: &serde_json::Map<String, Value>, at: &str) -> Result<PromptRequest, ConfigError> {
    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("text") => PromptKind::Text,
        Some("confirm") => PromptKind::Confirm,
        _ => {
            return Err(invalid(
                &format!("{at}.type"),
                "must be 'text' or 'confirm'",
            ));
        }
    };
    let label = obj
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(&format!("{at}.label"), "must be a string"))?;
    let default = match (kind, obj.get("initial")) {
        (_, None | Some(Value::Null)) => None,
        (PromptKind::Text, Some(Value::String(s))) => Some(ParamValue::Text(s.clone())),
        (PromptKind::Confirm, Some(Value::Bool(b))) => Some(ParamValue::Bool(*b)),
        (PromptKind::Text, Some(_)) => {
            return Err(invalid(&format!("{at}.initial"), "must be a string for text prompts"));
        }
        (PromptKind::Confirm, Some(_)) => {
            return Err(invalid(&format!("{at}.initial"), "must be a boolean for confirm prompts"));
        }
    };
    Ok(PromptRequest {
        kind,
        label: label.to_string(),
        default,
    })
}

/// Parse one resolvable node (and its children).
///
/// # Errors
///
/// Returns [`ConfigError::ManifestInvalid`] naming the first bad node.
pub fn parse_resolvable(value: &Value, at: &str) -> Result<Resolvable, ConfigError> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(at, "resolvable must be an object"))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(&format!("{at}.type"), "must be a string"))?;
    let a = parse_operand(obj.get("a"), &format!("{at}.a"))?;
    let b = parse_operand(obj.get("b"), &format!("{at}.b"))?;
    let result = parse_result(obj, &format!("{at}.result"))?;

    match kind {
        "match" => Ok(Resolvable::Match(Condition { a, b, result })),
        "contain" => Ok(Resolvable::Contain(Condition { a, b, result })),
        "not" => Ok(Resolvable::Not(Condition { a, b, result })),
        "format" => match result {
            Some(ConditionResult::Text(template)) => Ok(Resolvable::Format { a, b, template }),
            _ => Err(invalid(&format!("{at}.result"), "format requires a string result")),
        },
        "$or" | "or" => match result {
            None => Ok(Resolvable::Or { a, b }),
            Some(_) => Err(invalid(&format!("{at}.result"), "$or does not take a result")),
        },
        other => Err(invalid(
            &format!("{at}.type"),
            format!("unknown resolvable type '{other}'"),
        )),
    }
}

fn parse_operand(value: Option<&Value>, at: &str) -> Result<Operand, ConfigError> {
    match value {
        Some(Value::String(s)) => Ok(Operand::Literal(ParamValue::Text(s.clone()))),
        Some(Value::Bool(b)) => Ok(Operand::Literal(ParamValue::Bool(*b))),
        Some(nested @ Value::Object(_)) => Ok(Operand::Nested(Box::new(parse_resolvable(nested, at)?))),
        Some(_) => Err(invalid(at, "must be a string, a boolean or a resolvable")),
        None => Err(invalid(at, "is required")),
    }
}

fn parse_result(obj: &Map<String, Value>, at: &str) -> Result<Option<ConditionResult>, ConfigError> {
    match obj.get("result") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(ConditionResult::Text(s.clone()))),
        Some(Value::Bool(true)) => Ok(Some(ConditionResult::True)),
        Some(_) => Err(invalid(at, "must be a string or true")),
    }
}

/// Parse every entry of an optional object section with `parse`, keeping
/// document order.
fn parse_entries<T>(
    value: Option<&Value>,
    section: &str,
    parse: fn(&Value, &str) -> Result<T, ConfigError>,
) -> Result<Vec<(String, T)>, ConfigError> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(invalid(section, "must be an object")),
    };
    obj.iter()
        .map(|(key, v)| {
            let at = format!("{section}.{key}");
            if key.is_empty() {
                return Err(invalid(&at, "key must not be empty"));
            }
            Ok((key.clone(), parse(v, &at)?))
        })
        .collect()
}

/// Text-producing resolvables must name their result unless they are `$or`.
fn require_text_result(node: &Resolvable, at: &str) -> Result<(), ConfigError> {
    match node {
        Resolvable::Match(c) | Resolvable::Contain(c) | Resolvable::Not(c)
            if !matches!(c.result, Some(ConditionResult::Text(_))) =>
        {
            Err(invalid(
                &format!("{at}.result"),
                format!("'{}' must have a string result here", node.kind()),
            ))
        }
        _ => Ok(()),
    }
}

fn parse_text_resolver(value: &Value, at: &str) -> Result<Resolver<String>, ConfigError> {
    match value {
        Value::String(s) => Ok(Resolver::Literal(s.clone())),
        Value::Object(_) => {
            let node = parse_resolvable(value, at)?;
            require_text_result(&node, at)?;
            Ok(Resolver::Expression(node))
        }
        _ => Err(invalid(at, "must be a string or a resolvable")),
    }
}

fn parse_variable(value: &Value, at: &str) -> Result<Resolver<String>, ConfigError> {
    parse_text_resolver(value, at)
}

fn parse_exclude(value: &Value, at: &str) -> Result<Resolver<bool>, ConfigError> {
    match value {
        Value::Bool(b) => Ok(Resolver::Literal(*b)),
        Value::Object(_) => match parse_resolvable(value, at)? {
            Resolvable::Format { .. } => Err(invalid(
                &format!("{at}.type"),
                "format is not allowed for excludes",
            )),
            node => Ok(Resolver::Expression(node)),
        },
        _ => Err(invalid(at, "must be a boolean or a resolvable")),
    }
}

fn parse_file_builder(value: &Value, at: &str) -> Result<FileBuilderEntry, ConfigError> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(at, "must be an object"))?;
    let file_path = obj
        .get("filePath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid(&format!("{at}.filePath"), "must be a non-empty string"))?;
    let content_at = format!("{at}.content");
    let content = parse_text_resolver(
        obj.get("content")
            .ok_or_else(|| invalid(&content_at, "is required"))?,
        &content_at,
    )?;
    Ok(FileBuilderEntry {
        file_path: file_path.to_string(),
        content,
    })
}
