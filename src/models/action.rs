use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEFAULT_THRESHOLD: f64 = 0.8;
pub const DEFAULT_WAIT_SECONDS: f64 = 1.0;
/// Longest accepted wait or interval: one day
pub const MAX_SECONDS: f64 = 86_400.0;

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_wait() -> f64 {
    DEFAULT_WAIT_SECONDS
}

/// One step of an automation sequence.
///
/// Serialized as an object with a `type` discriminator:
/// `{"type": "click_text", "text": "OK", "required": true}`.
/// Unknown `type` values fail to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Find text on screen by OCR and click its center
    ClickText {
        text: String,
        #[serde(default)]
        required: bool,
    },
    /// Find an image template on screen and click its center
    ClickTemplate {
        #[serde(rename = "template")]
        template_path: PathBuf,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default)]
        required: bool,
    },
    /// Click at a fixed offset from the window's top-left corner
    ClickPosition {
        x: i32,
        y: i32,
        #[serde(default)]
        required: bool,
    },
    /// Type text into the focused control
    TypeText {
        text: String,
        #[serde(default)]
        required: bool,
    },
    /// Pause the sequence
    Wait {
        #[serde(rename = "duration", default = "default_wait")]
        duration_seconds: f64,
    },
}

impl Action {
    /// Whether a failure of this action stops the automation
    pub fn required(&self) -> bool {
        match self {
            Action::ClickText { required, .. }
            | Action::ClickTemplate { required, .. }
            | Action::ClickPosition { required, .. }
            | Action::TypeText { required, .. } => *required,
            Action::Wait { .. } => false,
        }
    }

    /// Serialized type name
    pub fn kind(&self) -> &'static str {
        match self {
            Action::ClickText { .. } => "click_text",
            Action::ClickTemplate { .. } => "click_template",
            Action::ClickPosition { .. } => "click_position",
            Action::TypeText { .. } => "type_text",
            Action::Wait { .. } => "wait",
        }
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<()> {
        match self {
            Action::ClickText { text, .. } | Action::TypeText { text, .. } if text.trim().is_empty() => {
                Err(AppError::ConfigError(format!("{} action has no text", self.kind())))
            }
            Action::ClickTemplate { template_path, .. } if template_path.as_os_str().is_empty() => Err(
                AppError::ConfigError("click_template action has no template path".to_string()),
            ),
            Action::ClickTemplate { threshold, .. } if !(0.0..=1.0).contains(threshold) => {
                Err(AppError::ConfigError(format!(
                    "click_template threshold {} is outside 0.0-1.0",
                    threshold
                )))
            }
            Action::Wait { duration_seconds } if !(0.0..=MAX_SECONDS).contains(duration_seconds) => {
                Err(AppError::ConfigError(format!(
                    "wait duration {} must be between 0 and {} seconds",
                    duration_seconds, MAX_SECONDS
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ClickText { text, .. } => write!(f, "Click on text: '{}'", text),
            Action::ClickTemplate {
                template_path,
                threshold,
                ..
            } => write!(
                f,
                "Click on template: '{}' (threshold {:.2})",
                template_path.display(),
                threshold
            ),
            Action::ClickPosition { x, y, .. } => write!(f, "Click at position: ({}, {})", x, y),
            Action::TypeText { text, .. } => write!(f, "Type text: '{}'", text),
            Action::Wait { duration_seconds } => write!(f, "Wait for {} seconds", duration_seconds),
        }?;
        if self.required() {
            write!(f, " [required]")?;
        }
        Ok(())
    }
}
