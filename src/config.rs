use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Action, MAX_SECONDS};

/// External tool settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tesseract_cmd: String,
    pub ocr_lang: String,
    pub xdotool_cmd: String,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tesseract_cmd: env::var("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            ocr_lang: env::var("OCR_LANG").unwrap_or(defaults.ocr_lang),
            xdotool_cmd: env::var("XDOTOOL_CMD").unwrap_or(defaults.xdotool_cmd),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            ocr_lang: "eng".to_string(),
            xdotool_cmd: "xdotool".to_string(),
        }
    }
}

fn default_interval() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_retry_count() -> u32 {
    3
}

/// Automation settings and action sequence, persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Seconds to sleep between actions
    #[serde(rename = "interval", default = "default_interval")]
    pub interval_seconds: f64,
    /// Raise the window before each action
    #[serde(default = "default_true")]
    pub activate_window: bool,
    /// Detection attempts per text/template action
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default)]
    pub debug_mode: bool,
    /// Start over from the first action after the last one
    #[serde(default = "default_true")]
    pub loop_actions: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            activate_window: true,
            retry_count: default_retry_count(),
            debug_mode: false,
            loop_actions: true,
            actions: Vec::new(),
        }
    }
}

impl AutomationConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&contents)
            .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), config_reason(e))))?;
        tracing::info!("Loaded {} actions from {}", config.actions.len(), path.display());
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize configuration: {}", e)))?;
        std::fs::write(path, json).map_err(|e| {
            AppError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check settings and every action
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_SECONDS).contains(&self.interval_seconds) {
            return Err(AppError::ConfigError(format!(
                "interval {} must be between 0 and {} seconds",
                self.interval_seconds, MAX_SECONDS
            )));
        }
        if self.retry_count < 1 {
            return Err(AppError::ConfigError("retry_count must be at least 1".to_string()));
        }
        if self.actions.is_empty() {
            return Err(AppError::ConfigError("No actions found in configuration".to_string()));
        }
        for (index, action) in self.actions.iter().enumerate() {
            action
                .validate()
                .map_err(|e| AppError::ConfigError(format!("action {}: {}", index + 1, config_reason(e))))?;
        }
        Ok(())
    }
}

/// Message of a nested configuration error without its own prefix
fn config_reason(error: AppError) -> String {
    match error {
        AppError::ConfigError(reason) => reason,
        other => other.to_string(),
    }
}
