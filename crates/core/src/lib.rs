//! Core traits and types for the bilingual chatbot
//!
//! This crate provides foundational types used across all other crates:
//! - Language tags and translation directions (Persian/English)
//! - Conversation turns
//! - Generation parameters and model roles
//! - Traits for pluggable inference backends and language classifiers
//! - Error types and their user-facing categories

pub mod conversation;
pub mod error;
pub mod language;
pub mod models;
pub mod traits;

pub use conversation::{Turn, TurnRole};
pub use error::{Error, ErrorCategory, Result};
pub use language::{Language, TranslationDirection};
pub use models::{GenerationParams, LoadedModels, ModelRole};
pub use traits::{InferenceModel, LanguageClassifier, ModelLoader};
