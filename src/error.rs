use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Could not find {target} after {attempts} attempts")]
    DetectionFailure { target: String, attempts: u32 },

    #[error("Input injection failed: {0}")]
    InjectionFailure(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Could not load template image {}: {reason}", path.display())]
    TemplateUnreadable { path: PathBuf, reason: String },

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short category name used in logs and run reports
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ResourceUnavailable(_) => "resource_unavailable",
            AppError::DetectionFailure { .. } => "detection_failure",
            AppError::InjectionFailure(_) => "injection_failure",
            AppError::ConfigError(_) => "config_error",
            AppError::TemplateUnreadable { .. } => "template_unreadable",
            AppError::UserCancelled => "user_cancelled",
            AppError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
