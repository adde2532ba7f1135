//! Application State
//!
//! Shared state across all handlers.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use parsbot_agent::{Chatbot, ConversationConfig};
use parsbot_config::{load_settings, Settings};
use parsbot_llm::ModelRegistry;

use crate::session::{Session, SessionManager};
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration; reloadable at runtime
    pub config: Arc<RwLock<Settings>>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Models shared by every session
    pub registry: Arc<ModelRegistry>,
    env: Option<String>,
}

impl AppState {
    pub fn new(config: Settings, registry: Arc<ModelRegistry>) -> Self {
        let sessions = SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_secs),
            Duration::from_secs(config.server.cleanup_interval_secs),
        );
        Self {
            config: Arc::new(RwLock::new(config)),
            sessions: Arc::new(sessions),
            registry,
            env: None,
        }
    }

    /// Remember the environment name so config reloads read the same files
    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Start a session with a fresh chatbot over the shared registry
    ///
    /// Detection, translation and conversation settings are read at creation
    /// time, so a reload only affects sessions created afterwards.
    pub fn create_session(&self) -> Result<Arc<Session>, ServerError> {
        let (chatbot, conversation) = {
            let config = self.config.read();
            (
                Chatbot::from_settings(self.registry.clone(), &config),
                ConversationConfig::from_settings(&config),
            )
        };
        self.sessions.create(chatbot, conversation)
    }

    /// Reload configuration from files and environment
    pub fn reload_config(&self) -> Result<(), ServerError> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| ServerError::Internal(format!("Failed to reload config: {}", e)))?;

        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
