//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{conversation, detection, generation, models, server, translation};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Dialogue generation defaults
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Translation generation and cache
    #[serde(default)]
    pub translation: TranslationConfig,

    /// History cap and cache clearing cadence
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Inference endpoint and model bindings
    #[serde(default)]
    pub models: ModelsConfig,

    /// Language detection
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_generation()?;
        self.validate_translation()?;
        self.validate_conversation()?;
        self.validate_models()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }
        if self.server.max_sessions == 0 {
            return Err(invalid("server.max_sessions", "Must allow at least one session"));
        }
        Ok(())
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        validate_beam_settings(
            "generation",
            self.generation.max_length,
            self.generation.num_beams,
        )
    }

    fn validate_translation(&self) -> Result<(), ConfigError> {
        validate_beam_settings(
            "translation",
            self.translation.max_length,
            self.translation.num_beams,
        )?;
        if self.translation.cache_capacity == 0 {
            return Err(invalid(
                "translation.cache_capacity",
                "Cache capacity must be at least 1",
            ));
        }
        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        // One exchange is a user turn plus a bot turn
        if self.conversation.history_limit < 2 {
            return Err(invalid(
                "conversation.history_limit",
                &format!(
                    "Must hold at least one exchange (2 turns), got {}",
                    self.conversation.history_limit
                ),
            ));
        }
        if self.conversation.cache_clear_interval == 0 {
            return Err(invalid(
                "conversation.cache_clear_interval",
                "Interval must be at least 1",
            ));
        }
        Ok(())
    }

    fn validate_models(&self) -> Result<(), ConfigError> {
        let models = &self.models;
        for (field, value) in [
            ("models.endpoint", &models.endpoint),
            ("models.dialogue", &models.dialogue),
            ("models.translate_fa_en", &models.translate_fa_en),
            ("models.translate_en_fa", &models.translate_en_fa),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "Cannot be empty"));
            }
        }
        if !models.endpoint.starts_with("http://") && !models.endpoint.starts_with("https://") {
            return Err(invalid(
                "models.endpoint",
                &format!("Must be an http(s) URL, got {}", models.endpoint),
            ));
        }
        if models.timeout_secs == 0 {
            return Err(invalid("models.timeout_secs", "Timeout must be at least 1 second"));
        }
        Ok(())
    }
}

fn validate_beam_settings(
    section: &str,
    max_length: usize,
    num_beams: usize,
) -> Result<(), ConfigError> {
    if max_length == 0 || max_length > generation::MAX_LENGTH_LIMIT {
        return Err(invalid(
            &format!("{}.max_length", section),
            &format!(
                "Must be between 1 and {}, got {}",
                generation::MAX_LENGTH_LIMIT,
                max_length
            ),
        ));
    }
    if num_beams == 0 || num_beams > generation::NUM_BEAMS_LIMIT {
        return Err(invalid(
            &format!("{}.num_beams", section),
            &format!(
                "Must be between 1 and {}, got {}",
                generation::NUM_BEAMS_LIMIT,
                num_beams
            ),
        ));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum concurrent chat sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time before a session is dropped
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_host() -> String {
    server::HOST.to_string()
}
fn default_port() -> u16 {
    server::PORT
}
fn default_true() -> bool {
    true
}
fn default_max_sessions() -> usize {
    server::MAX_SESSIONS
}
fn default_session_timeout() -> u64 {
    server::SESSION_TIMEOUT_SECS
}
fn default_cleanup_interval() -> u64 {
    server::CLEANUP_INTERVAL_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_sessions: default_max_sessions(),
            session_timeout_secs: default_session_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Dialogue generation defaults, used when a request does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_num_beams")]
    pub num_beams: usize,
}

fn default_max_length() -> usize {
    generation::MAX_LENGTH
}
fn default_num_beams() -> usize {
    generation::NUM_BEAMS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            num_beams: default_num_beams(),
        }
    }
}

/// Translation generation parameters and cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Inputs longer than this are truncated before translation
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_num_beams")]
    pub num_beams: usize,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    translation::CACHE_CAPACITY
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            num_beams: default_num_beams(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Conversation bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Clear the translation cache after every N successful exchanges
    #[serde(default = "default_cache_clear_interval")]
    pub cache_clear_interval: usize,
}

fn default_history_limit() -> usize {
    conversation::HISTORY_LIMIT
}
fn default_cache_clear_interval() -> usize {
    conversation::CACHE_CLEAR_INTERVAL
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            cache_clear_interval: default_cache_clear_interval(),
        }
    }
}

/// Compute device requested from the inference backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

/// Inference endpoint and model bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Base URL of a Hugging Face Inference API compatible server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token, if the endpoint requires one
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_dialogue_model")]
    pub dialogue: String,

    #[serde(default = "default_fa_en_model")]
    pub translate_fa_en: String,

    #[serde(default = "default_en_fa_model")]
    pub translate_en_fa: String,

    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub device: Device,

    /// Half precision; only honoured on cuda
    #[serde(default)]
    pub use_fp16: bool,

    /// Ask the endpoint to block until a cold model is loaded
    #[serde(default = "default_true")]
    pub wait_for_model: bool,

    /// Check that each model exists on the endpoint while loading
    #[serde(default = "default_true")]
    pub verify_on_load: bool,
}

fn default_endpoint() -> String {
    models::ENDPOINT.to_string()
}
fn default_dialogue_model() -> String {
    models::DIALOGUE.to_string()
}
fn default_fa_en_model() -> String {
    models::TRANSLATE_FA_EN.to_string()
}
fn default_en_fa_model() -> String {
    models::TRANSLATE_EN_FA.to_string()
}
fn default_model_timeout() -> u64 {
    models::TIMEOUT_SECS
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            dialogue: default_dialogue_model(),
            translate_fa_en: default_fa_en_model(),
            translate_en_fa: default_en_fa_model(),
            timeout_secs: default_model_timeout(),
            device: Device::default(),
            use_fp16: false,
            wait_for_model: true,
            verify_on_load: true,
        }
    }
}

/// Language detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Use the statistical classifier when it is compiled in
    #[serde(default = "default_true")]
    pub statistical_enabled: bool,

    /// Inputs must be longer than this for the statistical path
    #[serde(default = "default_min_statistical_length")]
    pub min_statistical_length: usize,
}

fn default_min_statistical_length() -> usize {
    detection::MIN_STATISTICAL_LENGTH
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            statistical_enabled: true,
            min_statistical_length: default_min_statistical_length(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.* > config/default.* > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("PARSBOT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
