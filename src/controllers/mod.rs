//! Stateful front-end controllers: one per view that talks to the backend.

pub mod configurations;
pub mod documents;
pub mod prompts;
pub mod verification;

use strum::Display;

use crate::services::api::ApiError;
use crate::services::upload::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Transient feedback shown after an action (the snackbar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("{0}")]
    Validation(String),

    #[error("Error: Cannot update prompt without an ID")]
    MissingId,

    #[error("Nothing selected to upload")]
    NothingSelected,

    #[error("Unknown configuration: {0}")]
    UnknownConfig(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid response format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl ManagerError {
    pub fn user_message(&self) -> String {
        match self {
            ManagerError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ManagerError::Api(e) if e.is_auth())
    }
}

/// Decode a list response element by element, dropping entries that do not parse.
pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(value: serde_json::Value, what: &str) -> Vec<T> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| {
                serde_json::from_value(item)
                    .inspect_err(|e| tracing::warn!(error = %e, kind = what, "Skipping malformed entry"))
                    .ok()
            })
            .collect(),
        other => {
            tracing::warn!(kind = what, response = %other, "Expected a list response");
            Vec::new()
        }
    }
}
