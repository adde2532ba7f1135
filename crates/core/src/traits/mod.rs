//! Core traits for the chatbot
//!
//! All pluggable components implement these traits so backends can be swapped
//! by configuration and replaced with mocks in tests.
//!
//! ```text
//! Inference:
//!   - InferenceModel: prepared text → generated text (dialogue or translation)
//!   - ModelLoader: acquires an InferenceModel for a ModelRole
//!
//! Language identification:
//!   - LanguageClassifier: text → language code
//! ```

mod classifier;
mod inference;

pub use classifier::LanguageClassifier;
pub use inference::{InferenceModel, ModelLoader};
