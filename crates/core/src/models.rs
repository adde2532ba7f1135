//! Model roles, generation parameters and the loaded model set

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::traits::InferenceModel;
use crate::TranslationDirection;

/// n-gram size that may not repeat in generated output
pub const NO_REPEAT_NGRAM_SIZE: usize = 2;

/// Which of the three model bindings a handle serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Dialogue,
    TranslateFaEn,
    TranslateEnFa,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Dialogue => "dialogue",
            ModelRole::TranslateFaEn => "translate_fa_en",
            ModelRole::TranslateEnFa => "translate_en_fa",
        }
    }
}

impl From<TranslationDirection> for ModelRole {
    fn from(direction: TranslationDirection) -> Self {
        match direction {
            TranslationDirection::FaEn => ModelRole::TranslateFaEn,
            TranslationDirection::EnFa => ModelRole::TranslateEnFa,
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters forwarded to the inference API on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: usize,
    pub no_repeat_ngram_size: usize,
    pub early_stopping: bool,
}

impl GenerationParams {
    /// Beam search settings with the fixed n-gram and stopping options
    pub fn new(max_length: usize, num_beams: usize) -> Self {
        Self {
            max_length,
            num_beams,
            no_repeat_ngram_size: NO_REPEAT_NGRAM_SIZE,
            early_stopping: true,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(128, 4)
    }
}

/// Handles for all three models, available only once loading succeeded
#[derive(Clone)]
pub struct LoadedModels {
    pub dialogue: Arc<dyn InferenceModel>,
    pub translate_fa_en: Arc<dyn InferenceModel>,
    pub translate_en_fa: Arc<dyn InferenceModel>,
}

impl LoadedModels {
    pub fn get(&self, role: ModelRole) -> &Arc<dyn InferenceModel> {
        match role {
            ModelRole::Dialogue => &self.dialogue,
            ModelRole::TranslateFaEn => &self.translate_fa_en,
            ModelRole::TranslateEnFa => &self.translate_en_fa,
        }
    }

    /// Translation model bound to a direction
    pub fn translator(&self, direction: TranslationDirection) -> &Arc<dyn InferenceModel> {
        self.get(direction.into())
    }
}

impl std::fmt::Debug for LoadedModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModels")
            .field("dialogue", &self.dialogue.name())
            .field("translate_fa_en", &self.translate_fa_en.name())
            .field("translate_en_fa", &self.translate_en_fa.name())
            .finish()
    }
}
