//! Response orchestration
//!
//! ```text
//! input ─► ensure models ─► detect ─┬─ en ──────────────────► dialogue ─────────────────► reply
//!                                   └─ fa ─► translate fa_en ─► dialogue ─► translate en_fa ─► reply
//! ```
//!
//! Empty input is rejected before any model or cache access. A registry load
//! failure surfaces as `ModelLoad` unchanged; failures after that are wrapped as
//! `ResponseGeneration`. Nothing is retried.

use std::sync::Arc;

use parsbot_config::{constants, Settings};
use parsbot_core::{Error, GenerationParams, LoadedModels, Result};
use parsbot_llm::{ModelRegistry, RegistryState};
use parsbot_text_processing::{CacheStats, CachedTranslator, LanguageDetector};

/// Reject generation overrides outside `1..=MAX_LENGTH_LIMIT` and `1..=NUM_BEAMS_LIMIT`
pub fn check_generation_params(max_length: usize, num_beams: usize) -> Result<()> {
    use constants::generation::{MAX_LENGTH_LIMIT, NUM_BEAMS_LIMIT};

    if !(1..=MAX_LENGTH_LIMIT).contains(&max_length) {
        return Err(Error::InvalidInput(format!(
            "max_length must be between 1 and {} (got {})",
            MAX_LENGTH_LIMIT, max_length
        )));
    }
    if !(1..=NUM_BEAMS_LIMIT).contains(&num_beams) {
        return Err(Error::InvalidInput(format!(
            "num_beams must be between 1 and {} (got {})",
            NUM_BEAMS_LIMIT, num_beams
        )));
    }
    Ok(())
}

/// Bilingual chatbot over a shared model registry
///
/// Owns its translation cache. Several chatbots may share one registry since
/// they all bind the same three models.
pub struct Chatbot {
    registry: Arc<ModelRegistry>,
    detector: LanguageDetector,
    translator: CachedTranslator,
}

impl Chatbot {
    pub fn new(
        registry: Arc<ModelRegistry>,
        detector: LanguageDetector,
        translator: CachedTranslator,
    ) -> Self {
        Self {
            registry,
            detector,
            translator,
        }
    }

    pub fn from_settings(registry: Arc<ModelRegistry>, settings: &Settings) -> Self {
        Self::new(
            registry,
            LanguageDetector::from_settings(&settings.detection),
            CachedTranslator::from_settings(&settings.translation),
        )
    }

    /// Produce a reply in the language of `user_input`
    pub async fn generate_response(
        &self,
        user_input: &str,
        max_length: usize,
        num_beams: usize,
    ) -> Result<String> {
        if user_input.trim().is_empty() {
            return Err(Error::InvalidInput("Message cannot be empty".to_string()));
        }
        check_generation_params(max_length, num_beams)?;

        let models = self.registry.ensure_loaded().await?;
        let params = GenerationParams::new(max_length, num_beams);

        self.run_pipeline(&models, user_input, &params)
            .await
            .map_err(Error::generation)
    }

    async fn run_pipeline(
        &self,
        models: &LoadedModels,
        user_input: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        let language = self.detector.detect(user_input)?;

        let prepared = match language.inbound_direction() {
            Some(direction) => {
                self.translator
                    .translate(models, user_input, direction)
                    .await?
            },
            None => user_input.to_string(),
        };

        let output = models.dialogue.generate(&prepared, params).await?;
        if output.trim().is_empty() {
            return Err(Error::Inference(format!(
                "{} returned an empty reply",
                models.dialogue.name()
            )));
        }

        let reply = match language.outbound_direction() {
            Some(direction) => self.translator.translate(models, &output, direction).await?,
            None => output,
        };

        tracing::debug!(
            language = %language,
            input_chars = user_input.chars().count(),
            reply_chars = reply.chars().count(),
            "Generated response"
        );
        Ok(reply)
    }

    /// Empty this chatbot's translation cache
    pub fn clear_cache(&self) {
        self.translator.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.translator.cache().stats()
    }

    pub fn registry_state(&self) -> RegistryState {
        self.registry.state()
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }
}
