//! Extension points observed by the resolution, assembly and output stages.
//!
//! A listener implements [`RocketHooks`], overriding only the methods it
//! cares about; every method defaults to a no-op. Listeners are registered on
//! a [`HookBus`], which the pipeline receives by `&mut` and dispatches through
//! in registration order. Each extension point passes one plain state struct
//! by mutable reference; the pipeline reads the state back only after every
//! listener has run. Returning a [`HookAbort`] stops the whole operation.
use std::collections::BTreeMap;
use std::fmt;

use crate::assemble::FrameFileState;
use crate::config::{
    BuiltFile, FileBuilderEntry, ParamValue, Parameter, ParameterEnv, ParameterResolver, Resolver,
};
pub use crate::error::HookAbort;
use crate::output::FileOutputState;
use crate::prompt::PromptKind;

/// Result returned by every hook method.
pub type HookResult = Result<(), HookAbort>;

/// State for [`RocketHooks::on_parameter`].
///
/// Inserting `parameter.id` into `resolved` skips the parameter's own
/// resolver (no prompt is shown).
#[derive(Debug)]
pub struct ParameterState<'a> {
    /// Parameter about to be resolved.
    pub parameter: &'a Parameter,
    /// Parameters resolved so far.
    pub resolved: &'a mut ParameterEnv,
}

/// State for [`RocketHooks::on_variable_resolve`].
#[derive(Debug)]
pub struct VariableState<'a> {
    /// Variable token.
    pub name: &'a str,
    /// Declared resolver.
    pub resolver: &'a Resolver<String>,
    /// Variables resolved so far; inserting `name` pre-seeds it.
    pub resolved: &'a mut BTreeMap<String, String>,
}

/// State for [`RocketHooks::on_exclude_resolve`].
#[derive(Debug)]
pub struct ExcludeState<'a> {
    /// Relative path the rule applies to.
    pub path: &'a str,
    /// Declared resolver.
    pub resolver: &'a Resolver<bool>,
    /// Excludes resolved so far; inserting `path` pre-seeds it.
    pub resolved: &'a mut BTreeMap<String, bool>,
}

/// State for [`RocketHooks::on_file_builder_resolve`].
#[derive(Debug)]
pub struct FileBuilderState<'a> {
    /// Builder key.
    pub key: &'a str,
    /// Declared entry.
    pub entry: &'a FileBuilderEntry,
    /// Builder files resolved so far; inserting `key` pre-seeds it.
    pub resolved: &'a mut BTreeMap<String, BuiltFile>,
}

/// State for [`RocketHooks::on_extract`].
#[derive(Debug)]
pub struct ExtractState<'a> {
    /// Decompressed archive entries by relative path.
    pub entries: &'a mut BTreeMap<String, Vec<u8>>,
}

/// Listener for pipeline extension points.
///
/// All methods default to doing nothing.
pub trait RocketHooks {
    /// Before a parameter is resolved.
    fn on_parameter(&mut self, _state: &mut ParameterState<'_>) -> HookResult {
        Ok(())
    }

    /// Before a variable is resolved.
    fn on_variable_resolve(&mut self, _state: &mut VariableState<'_>) -> HookResult {
        Ok(())
    }

    /// Before an exclude rule is resolved.
    fn on_exclude_resolve(&mut self, _state: &mut ExcludeState<'_>) -> HookResult {
        Ok(())
    }

    /// Before a file-builder entry is resolved.
    fn on_file_builder_resolve(&mut self, _state: &mut FileBuilderState<'_>) -> HookResult {
        Ok(())
    }

    /// Before a frame or builder file is considered for output.
    fn on_frame_file(&mut self, _state: &mut FrameFileState) -> HookResult {
        Ok(())
    }

    /// Before a file is written.
    fn on_write(&mut self, _state: &mut FileOutputState) -> HookResult {
        Ok(())
    }

    /// After existing content is read for a merge, before the merge result
    /// is computed. Setting `merge_result` replaces the built-in merge.
    fn on_merge(&mut self, _state: &mut FileOutputState) -> HookResult {
        Ok(())
    }

    /// After a pack is decompressed, before it is inspected.
    fn on_extract(&mut self, _state: &mut ExtractState<'_>) -> HookResult {
        Ok(())
    }
}

/// Ordered collection of hook listeners.
#[derive(Default)]
pub struct HookBus {
    listeners: Vec<Box<dyn RocketHooks>>,
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HookBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every listener registered before it.
    pub fn register(&mut self, listener: impl RocketHooks + 'static) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, listener: impl RocketHooks + 'static) -> Self {
        self.register(listener);
        self
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Return `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Generate one dispatch method on [`HookBus`] per extension point.
macro_rules! dispatch_hooks {
    ($($(#[$doc:meta])* $method:ident => $hook:ident($state:ty)),+ $(,)?) => {
        impl HookBus {
            $(
                $(#[$doc])*
                ///
                /// # Errors
                ///
                /// Returns the first [`HookAbort`] raised by a listener.
                pub fn $method(&mut self, state: &mut $state) -> HookResult {
                    for listener in &mut self.listeners {
                        listener.$hook(state)?;
                    }
                    Ok(())
                }
            )+
        }
    };
}

dispatch_hooks! {
    /// Run every `on_parameter` listener.
    emit_parameter => on_parameter(ParameterState<'_>),
    /// Run every `on_variable_resolve` listener.
    emit_variable_resolve => on_variable_resolve(VariableState<'_>),
    /// Run every `on_exclude_resolve` listener.
    emit_exclude_resolve => on_exclude_resolve(ExcludeState<'_>),
    /// Run every `on_file_builder_resolve` listener.
    emit_file_builder_resolve => on_file_builder_resolve(FileBuilderState<'_>),
    /// Run every `on_frame_file` listener.
    emit_frame_file => on_frame_file(FrameFileState),
    /// Run every `on_write` listener.
    emit_write => on_write(FileOutputState),
    /// Run every `on_merge` listener.
    emit_merge => on_merge(FileOutputState),
    /// Run every `on_extract` listener.
    emit_extract => on_extract(ExtractState<'_>),
}

/// Pre-seeds parameters from `id=value` assignments so they are never
/// prompted.
///
/// Values for confirm parameters are parsed as booleans (`true`/`false`,
/// `yes`/`no`, `y`/`n`, `1`/`0`); everything else is taken as text.
#[derive(Debug, Default, Clone)]
pub struct PresetParameters {
    values: BTreeMap<String, String>,
}

impl PresetParameters {
    /// Create an empty preset list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one preset value.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
    }

    /// Parse `id=value` assignments.
    ///
    /// # Errors
    ///
    /// Returns the offending assignment if it has no `=` or an empty id.
    pub fn from_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self, String> {
        let mut presets = Self::new();
        for raw in assignments {
            let raw = raw.as_ref();
            match raw.split_once('=') {
                Some((id, value)) if !id.is_empty() => presets.insert(id, value),
                _ => return Err(format!("expected ID=VALUE, got '{raw}'")),
            }
        }
        Ok(presets)
    }

    /// Return `true` if no preset was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

impl RocketHooks for PresetParameters {
    fn on_parameter(&mut self, state: &mut ParameterState<'_>) -> HookResult {
        let id = &state.parameter.id;
        if state.resolved.contains_key(id) {
            return Ok(());
        }
        let Some(raw) = self.values.get(id) else {
            return Ok(());
        };
        let value = match &state.parameter.resolver {
            ParameterResolver::Prompt(request) if request.kind == PromptKind::Confirm => {
                ParamValue::Bool(parse_bool(raw).ok_or_else(|| {
                    HookAbort::new(
                        "on_parameter",
                        format!("'{raw}' is not a yes/no value for confirm parameter '{id}'"),
                    )
                })?)
            }
            _ => ParamValue::Text(raw.clone()),
        };
        state.resolved.insert(id.clone(), value);
        Ok(())
    }
}
