//! HTTP inference backend
//!
//! Talks to a Hugging Face Inference API compatible server. Each model binding is
//! reached at `POST {endpoint}/models/{model_id}` with a JSON body of the form
//!
//! ```json
//! {"inputs": "...", "parameters": {"max_length": 128, "num_beams": 4, ...}}
//! ```
//!
//! and answers with `[{"generated_text": "..."}]` (dialogue) or
//! `[{"translation_text": "..."}]` (translation). Requests are not retried.

use std::time::Duration;

use async_trait::async_trait;
use parsbot_config::{Device, ModelsConfig};
use parsbot_core::{GenerationParams, InferenceModel};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::LlmError;

/// Backend configuration shared by every model binding
#[derive(Debug, Clone)]
pub struct HttpInferenceConfig {
    /// API endpoint
    pub endpoint: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Requested compute device
    pub device: Device,
    /// Half precision, forwarded only for cuda
    pub use_fp16: bool,
    /// Block until a cold model is loaded instead of failing with 503
    pub wait_for_model: bool,
}

impl Default for HttpInferenceConfig {
    fn default() -> Self {
        Self::from_settings(&ModelsConfig::default())
    }
}

impl HttpInferenceConfig {
    pub fn from_settings(models: &ModelsConfig) -> Self {
        Self {
            endpoint: models.endpoint.trim_end_matches('/').to_string(),
            api_key: models.api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(models.timeout_secs),
            device: models.device,
            use_fp16: models.use_fp16,
            wait_for_model: models.wait_for_model,
        }
    }

    /// Whether half precision should be requested
    pub fn fp16_enabled(&self) -> bool {
        self.use_fp16 && self.device == Device::Cuda
    }

    /// Build the HTTP client for this configuration
    pub fn build_client(&self) -> Result<Client, LlmError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))
    }
}

/// One model binding on the inference server
#[derive(Debug, Clone)]
pub struct HttpInferenceModel {
    client: Client,
    config: HttpInferenceConfig,
    model_id: String,
}

impl HttpInferenceModel {
    /// Create a binding with its own HTTP client
    pub fn new(model_id: impl Into<String>, config: HttpInferenceConfig) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Self::with_client(client, model_id, config)
    }

    /// Create a binding sharing an existing client
    pub fn with_client(
        client: Client,
        model_id: impl Into<String>,
        config: HttpInferenceConfig,
    ) -> Result<Self, LlmError> {
        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(LlmError::Configuration("Model id cannot be empty".to_string()));
        }
        if config.use_fp16 && config.device != Device::Cuda {
            tracing::debug!(
                model = %model_id,
                device = config.device.as_str(),
                "fp16 requested without cuda, using full precision"
            );
        }
        Ok(Self {
            client,
            config,
            model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.config.endpoint, self.model_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Check that the endpoint knows this model
    pub async fn verify(&self) -> Result<(), LlmError> {
        let response = self
            .authorize(self.client.get(self.model_url()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(LlmError::ModelNotFound(self.model_id.clone())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(LlmError::Api(format!("{}: {}", status, body)))
            },
        }
    }

    /// Run one generation request
    pub async fn infer(&self, input: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let start = std::time::Instant::now();
        let request = InferenceRequest {
            inputs: input,
            parameters: InferenceParameters::from(params),
            options: InferenceOptions {
                wait_for_model: self.config.wait_for_model,
                use_cache: false,
                device: match self.config.device {
                    Device::Auto => None,
                    other => Some(other.as_str()),
                },
                use_fp16: self.config.fp16_enabled(),
            },
        };

        let outputs = self.execute_request(&request).await?;
        let text = outputs
            .into_iter()
            .find_map(InferenceOutput::into_text)
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("No output text from {}", self.model_id))
            })?;

        tracing::debug!(
            model = %self.model_id,
            input_chars = input.chars().count(),
            output_chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Inference complete"
        );

        Ok(text)
    }

    async fn execute_request(
        &self,
        request: &InferenceRequest<'_>,
    ) -> Result<Vec<InferenceOutput>, LlmError> {
        let response = self
            .authorize(self.client.post(self.model_url()))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                return Err(LlmError::ModelNotFound(self.model_id.clone()));
            }
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(error));
        }

        let body: InferenceResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        match body {
            InferenceResponse::Outputs(outputs) => Ok(outputs),
            InferenceResponse::Single(output) => Ok(vec![output]),
            InferenceResponse::Error { error } => Err(LlmError::Generation(error)),
        }
    }
}

#[async_trait]
impl InferenceModel for HttpInferenceModel {
    async fn generate(
        &self,
        input: &str,
        params: &GenerationParams,
    ) -> parsbot_core::Result<String> {
        Ok(self.infer(input, params).await?)
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions<'a>,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: usize,
    num_beams: usize,
    no_repeat_ngram_size: usize,
    early_stopping: bool,
}

impl From<&GenerationParams> for InferenceParameters {
    fn from(params: &GenerationParams) -> Self {
        Self {
            max_length: params.max_length,
            num_beams: params.num_beams,
            no_repeat_ngram_size: params.no_repeat_ngram_size,
            early_stopping: params.early_stopping,
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceOptions<'a> {
    wait_for_model: bool,
    use_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    use_fp16: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Outputs(Vec<InferenceOutput>),
    Error { error: String },
    Single(InferenceOutput),
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    #[serde(default)]
    generated_text: Option<String>,
    #[serde(default)]
    translation_text: Option<String>,
}

impl InferenceOutput {
    fn into_text(self) -> Option<String> {
        self.generated_text.or(self.translation_text)
    }
}
