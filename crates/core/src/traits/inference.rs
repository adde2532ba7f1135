//! Inference traits

use async_trait::async_trait;
use std::sync::Arc;

use crate::{GenerationParams, ModelRole, Result};

/// A loaded sequence-to-sequence model reachable through the inference API
///
/// Implementations:
/// - `HttpInferenceModel` - Hugging Face Inference API compatible endpoint
///
/// # Example
///
/// ```ignore
/// let params = GenerationParams::new(128, 4);
/// let reply = model.generate("Hello", &params).await?;
/// ```
#[async_trait]
pub trait InferenceModel: Send + Sync + 'static {
    /// Run generation on already prepared input text
    async fn generate(&self, input: &str, params: &GenerationParams) -> Result<String>;

    /// Model identifier for logging
    fn name(&self) -> &str;
}

/// Acquires model handles for the registry
#[async_trait]
pub trait ModelLoader: Send + Sync + 'static {
    /// Load the model bound to `role`
    ///
    /// Failures are reported as `Error::ModelLoad`.
    async fn load(&self, role: ModelRole) -> Result<Arc<dyn InferenceModel>>;
}
