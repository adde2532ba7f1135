//! Inference integration for the chatbot
//!
//! Features:
//! - HTTP backend for Hugging Face Inference API compatible endpoints
//! - Model loader producing the dialogue and translation bindings
//! - Model registry with at-most-once, all-or-nothing initialization

pub mod backend;
pub mod loader;
pub mod registry;

pub use backend::{HttpInferenceConfig, HttpInferenceModel};
pub use loader::HttpModelLoader;
pub use registry::{ModelRegistry, RegistryState};

use thiserror::Error;

/// Inference errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for parsbot_core::Error {
    fn from(err: LlmError) -> Self {
        parsbot_core::Error::Inference(err.to_string())
    }
}
