//! Configuration management for the chatbot
//!
//! Supports loading configuration from:
//! - `config/default.{toml,yaml,json}`
//! - `config/{env}.{toml,yaml,json}` selected by `PARSBOT_ENV`
//! - Environment variables (`PARSBOT_` prefix, `__` between sections)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, ConversationConfig, DetectionConfig, Device, GenerationConfig, ModelsConfig,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, TranslationConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => ConfigError::FileNotFound(path),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
