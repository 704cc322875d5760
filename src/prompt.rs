//! Interactive input for prompt parameters.
//!
//! The resolver only sees the [`Prompter`] trait. [`TerminalPrompter`] asks
//! on the terminal with `inquire`; [`DefaultsPrompter`] answers from the
//! declared defaults for unattended runs.
use thiserror::Error;

use crate::config::ParamValue;

/// Kind of answer a prompt expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Free-form text.
    Text,
    /// Yes / no.
    Confirm,
}

/// A question to put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Expected answer type.
    pub kind: PromptKind,
    /// Question shown to the user.
    pub label: String,
    /// Pre-filled answer, text for [`PromptKind::Text`] and a boolean for
    /// [`PromptKind::Confirm`].
    pub default: Option<ParamValue>,
}

/// Why a prompt produced no answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// The user dismissed the prompt (Esc / Ctrl-C).
    #[error("cancelled")]
    Cancelled,
    /// The backend could not ask.
    #[error("{0}")]
    Failed(String),
}

/// Source of answers for prompt parameters.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Ask one question.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Cancelled`] if the user dismissed the prompt.
    fn prompt(&self, request: &PromptRequest) -> Result<ParamValue, PromptError>;
}

/// Prompts on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, request: &PromptRequest) -> Result<ParamValue, PromptError> {
        match request.kind {
            PromptKind::Text => {
                let default = request.default.as_ref().map(ToString::to_string);
                let mut text = inquire::Text::new(&request.label);
                if let Some(d) = default.as_deref() {
                    text = text.with_default(d);
                }
                text.prompt().map(ParamValue::Text).map_err(from_inquire)
            }
            PromptKind::Confirm => {
                let mut confirm = inquire::Confirm::new(&request.label);
                if let Some(d) = request.default.as_ref() {
                    confirm = confirm.with_default(d.is_truthy());
                }
                confirm.prompt().map(ParamValue::Bool).map_err(from_inquire)
            }
        }
    }
}

fn from_inquire(e: inquire::InquireError) -> PromptError {
    match e {
        inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
            PromptError::Cancelled
        }
        other => PromptError::Failed(other.to_string()),
    }
}

/// Answers every prompt with its declared default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn prompt(&self, request: &PromptRequest) -> Result<ParamValue, PromptError> {
        match (&request.default, request.kind) {
            (Some(value), PromptKind::Text) => Ok(ParamValue::Text(value.to_string())),
            (Some(value), PromptKind::Confirm) => Ok(ParamValue::Bool(value.is_truthy())),
            (None, _) => Err(PromptError::Failed(format!(
                "'{}' has no default and input is non-interactive",
                request.label
            ))),
        }
    }
}
