//! Error types shared by all chatbot crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Chatbot errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Input rejected before any model or cache access
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model registry could not acquire its models
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// A pipeline step failed after the models were loaded
    #[error("Response generation failed: {source}")]
    ResponseGeneration {
        #[source]
        source: Box<Error>,
    },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Language detection error: {0}")]
    Detection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a pipeline failure, leaving already wrapped errors untouched
    pub fn generation(source: Error) -> Self {
        match source {
            err @ Error::ResponseGeneration { .. } => err,
            other => Error::ResponseGeneration {
                source: Box::new(other),
            },
        }
    }

    /// User-facing category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput(_) => ErrorCategory::InvalidInput,
            Error::ModelLoad(_) | Error::ResponseGeneration { .. } => {
                ErrorCategory::GenerationFailed
            },
            _ => ErrorCategory::Unexpected,
        }
    }
}

/// The three error classes surfaced to the user
///
/// Internal detail never crosses this boundary; only [`ErrorCategory::message`]
/// is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    GenerationFailed,
    Unexpected,
}

impl ErrorCategory {
    /// Message shown in the chat transcript
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid input",
            ErrorCategory::GenerationFailed => "generation failed",
            ErrorCategory::Unexpected => "unexpected error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
