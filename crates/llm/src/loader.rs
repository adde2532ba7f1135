//! Model loader for the HTTP backend

use std::sync::Arc;

use async_trait::async_trait;
use parsbot_config::ModelsConfig;
use parsbot_core::{Error, InferenceModel, ModelLoader, ModelRole, Result};
use reqwest::Client;

use crate::backend::{HttpInferenceConfig, HttpInferenceModel};
use crate::LlmError;

/// Binds each [`ModelRole`] to a model id on one inference endpoint
pub struct HttpModelLoader {
    client: Client,
    config: HttpInferenceConfig,
    dialogue: String,
    translate_fa_en: String,
    translate_en_fa: String,
    verify_on_load: bool,
}

impl HttpModelLoader {
    pub fn from_settings(models: &ModelsConfig) -> std::result::Result<Self, LlmError> {
        let config = HttpInferenceConfig::from_settings(models);
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            dialogue: models.dialogue.clone(),
            translate_fa_en: models.translate_fa_en.clone(),
            translate_en_fa: models.translate_en_fa.clone(),
            verify_on_load: models.verify_on_load,
        })
    }

    /// Model id bound to a role
    pub fn model_id(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Dialogue => &self.dialogue,
            ModelRole::TranslateFaEn => &self.translate_fa_en,
            ModelRole::TranslateEnFa => &self.translate_en_fa,
        }
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn load(&self, role: ModelRole) -> Result<Arc<dyn InferenceModel>> {
        let model_id = self.model_id(role);
        tracing::info!(
            role = %role,
            model = %model_id,
            device = self.config.device.as_str(),
            fp16 = self.config.fp16_enabled(),
            "Loading model"
        );

        let model = HttpInferenceModel::with_client(
            self.client.clone(),
            model_id,
            self.config.clone(),
        )
        .map_err(|e| Error::ModelLoad(format!("{} ({}): {}", role, model_id, e)))?;

        if self.verify_on_load {
            model
                .verify()
                .await
                .map_err(|e| Error::ModelLoad(format!("{} ({}): {}", role, model_id, e)))?;
        }

        Ok(Arc::new(model))
    }
}
