//! Model registry
//!
//! Holds the dialogue model and both translation models behind an explicit
//! lifecycle:
//!
//! ```text
//! Uninitialized ──► Loading ──► Ready
//!                      │
//!                      └──────► Failed (terminal)
//! ```
//!
//! Loading is all-or-nothing: the registry only becomes `Ready` once all three
//! handles were acquired. A failed registry keeps returning the same
//! `ModelLoad` error and never retries.

use std::sync::Arc;

use parking_lot::RwLock;
use parsbot_core::{Error, LoadedModels, ModelLoader, ModelRole, Result};
use serde::Serialize;
use tokio::sync::Mutex;

/// Observable registry state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl RegistryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryState::Uninitialized => "uninitialized",
            RegistryState::Loading => "loading",
            RegistryState::Ready => "ready",
            RegistryState::Failed => "failed",
        }
    }
}

enum Slot {
    Uninitialized,
    Loading,
    Ready(LoadedModels),
    Failed(String),
}

impl Slot {
    fn state(&self) -> RegistryState {
        match self {
            Slot::Uninitialized => RegistryState::Uninitialized,
            Slot::Loading => RegistryState::Loading,
            Slot::Ready(_) => RegistryState::Ready,
            Slot::Failed(_) => RegistryState::Failed,
        }
    }
}

/// Lazily initialized holder of the three model handles
pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    slot: RwLock<Slot>,
    /// Serializes initialization; held across the loader's awaits
    init_lock: Mutex<()>,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: RwLock::new(Slot::Uninitialized),
            init_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.slot.read().state()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.slot.read(), Slot::Ready(_))
    }

    /// Loaded handles, if the registry is ready
    pub fn models(&self) -> Option<LoadedModels> {
        match &*self.slot.read() {
            Slot::Ready(models) => Some(models.clone()),
            _ => None,
        }
    }

    /// Load all models on first use and return their handles
    ///
    /// Idempotent once `Ready`. Concurrent callers wait for the single
    /// initialization in flight. A `Failed` registry returns its stored
    /// `ModelLoad` error without touching the loader again.
    pub async fn ensure_loaded(&self) -> Result<LoadedModels> {
        if let Some(result) = self.settled() {
            return result;
        }

        let _guard = self.init_lock.lock().await;

        // Another caller may have finished while we waited
        if let Some(result) = self.settled() {
            return result;
        }

        // A `Loading` slot here belongs to an attempt whose future was dropped
        *self.slot.write() = Slot::Loading;
        tracing::info!("Loading models");

        match self.load_all().await {
            Ok(models) => {
                tracing::info!(
                    dialogue = models.dialogue.name(),
                    translate_fa_en = models.translate_fa_en.name(),
                    translate_en_fa = models.translate_en_fa.name(),
                    "Models ready"
                );
                *self.slot.write() = Slot::Ready(models.clone());
                Ok(models)
            },
            Err(message) => {
                tracing::error!(error = %message, "Model loading failed");
                *self.slot.write() = Slot::Failed(message.clone());
                Err(Error::ModelLoad(message))
            },
        }
    }

    fn settled(&self) -> Option<Result<LoadedModels>> {
        match &*self.slot.read() {
            Slot::Ready(models) => Some(Ok(models.clone())),
            Slot::Failed(message) => Some(Err(Error::ModelLoad(message.clone()))),
            Slot::Uninitialized | Slot::Loading => None,
        }
    }

    async fn load_all(&self) -> std::result::Result<LoadedModels, String> {
        let dialogue = self.load_role(ModelRole::Dialogue).await?;
        let translate_fa_en = self.load_role(ModelRole::TranslateFaEn).await?;
        let translate_en_fa = self.load_role(ModelRole::TranslateEnFa).await?;
        Ok(LoadedModels {
            dialogue,
            translate_fa_en,
            translate_en_fa,
        })
    }

    async fn load_role(
        &self,
        role: ModelRole,
    ) -> std::result::Result<Arc<dyn parsbot_core::InferenceModel>, String> {
        self.loader.load(role).await.map_err(|e| match e {
            Error::ModelLoad(message) => message,
            other => format!("{}: {}", role, other),
        })
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("state", &self.state())
            .finish()
    }
}
