//! Conversation bookkeeping around the chatbot
//!
//! One submission is processed at a time per conversation:
//!
//! 1. reject empty input or out-of-range generation parameters (history untouched)
//! 2. append the user turn and trim to the history cap
//! 3. generate a reply
//! 4. on success append the bot turn, trim, and clear the translation cache
//!    every N turns
//!
//! A turn is one message, user or bot. The cadence counts every turn ever
//! appended, so trimming the history does not slow it down.
//!
//! A failed turn leaves the user turn in the history without a bot reply.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use parsbot_config::{constants, Settings};
use parsbot_core::{Error, Result, Turn};
use serde::{Deserialize, Serialize};

use crate::chatbot::{check_generation_params, Chatbot};
use crate::history::ConversationHistory;

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum turns kept in the history
    pub history_limit: usize,
    /// Clear the translation cache every N turns (user and bot messages)
    pub cache_clear_interval: usize,
    /// Default dialogue `max_length`
    pub max_length: usize,
    /// Default dialogue `num_beams`
    pub num_beams: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: constants::conversation::HISTORY_LIMIT,
            cache_clear_interval: constants::conversation::CACHE_CLEAR_INTERVAL,
            max_length: constants::generation::MAX_LENGTH,
            num_beams: constants::generation::NUM_BEAMS,
        }
    }
}

impl ConversationConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            history_limit: settings.conversation.history_limit,
            cache_clear_interval: settings.conversation.cache_clear_interval,
            max_length: settings.generation.max_length,
            num_beams: settings.generation.num_beams,
        }
    }
}

/// A chat between one user and one [`Chatbot`]
pub struct Conversation {
    chatbot: Chatbot,
    config: ConversationConfig,
    history: Mutex<ConversationHistory>,
    /// Held for the whole of a submission
    turn_lock: tokio::sync::Mutex<()>,
    pending: AtomicBool,
    /// Turns ever appended; never decreases
    turns_appended: AtomicUsize,
    /// Multiples of the clear interval already acted on
    clear_epoch: AtomicUsize,
    successful_exchanges: AtomicUsize,
    started_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(chatbot: Chatbot, config: ConversationConfig) -> Self {
        Self {
            chatbot,
            history: Mutex::new(ConversationHistory::new(config.history_limit)),
            config,
            turn_lock: tokio::sync::Mutex::new(()),
            pending: AtomicBool::new(false),
            turns_appended: AtomicUsize::new(0),
            clear_epoch: AtomicUsize::new(0),
            successful_exchanges: AtomicUsize::new(0),
            started_at: Utc::now(),
        }
    }

    /// Submit a message with the configured generation defaults
    pub async fn submit(&self, message: &str) -> Result<String> {
        self.submit_with(message, self.config.max_length, self.config.num_beams)
            .await
    }

    /// Submit a message with explicit generation parameters
    pub async fn submit_with(
        &self,
        message: &str,
        max_length: usize,
        num_beams: usize,
    ) -> Result<String> {
        let _turn = self.turn_lock.lock().await;

        if message.trim().is_empty() {
            return Err(Error::InvalidInput("Message cannot be empty".to_string()));
        }
        check_generation_params(max_length, num_beams)?;

        let _pending = PendingGuard::set(&self.pending);
        self.append(Turn::user(message));

        match self
            .chatbot
            .generate_response(message, max_length, num_beams)
            .await
        {
            Ok(reply) => {
                self.append(Turn::bot(reply.clone()));
                self.successful_exchanges.fetch_add(1, Ordering::SeqCst);
                self.maybe_clear_cache();
                Ok(reply)
            },
            Err(e) => {
                tracing::warn!(
                    category = %e.category(),
                    error = %e,
                    "Turn failed"
                );
                Err(e)
            },
        }
    }

    fn append(&self, turn: Turn) {
        self.history.lock().push(turn);
        self.turns_appended.fetch_add(1, Ordering::SeqCst);
    }

    /// Clear once per interval boundary crossed since the last check
    ///
    /// Only called with `turn_lock` held.
    fn maybe_clear_cache(&self) {
        let turns = self.turns_appended.load(Ordering::SeqCst);
        let epoch = turns / self.config.cache_clear_interval.max(1);
        if epoch > self.clear_epoch.load(Ordering::SeqCst) {
            self.clear_epoch.store(epoch, Ordering::SeqCst);
            self.chatbot.clear_cache();
            tracing::info!(turns, "Cleared translation cache");
        }
    }

    /// Transcript, oldest turn first
    pub fn transcript(&self) -> Vec<Turn> {
        self.history.lock().to_vec()
    }

    pub fn turn_count(&self) -> usize {
        self.history.lock().len()
    }

    /// Turns appended since the conversation started, including trimmed ones
    pub fn turns_appended(&self) -> usize {
        self.turns_appended.load(Ordering::SeqCst)
    }

    pub fn successful_exchanges(&self) -> usize {
        self.successful_exchanges.load(Ordering::SeqCst)
    }

    /// Whether a reply is being generated right now
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn chatbot(&self) -> &Chatbot {
        &self.chatbot
    }

    /// Clear the translation cache on demand
    pub fn clear_cache(&self) {
        self.chatbot.clear_cache();
    }
}

/// Resets the pending flag even if the submission future is dropped
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parsbot_core::{GenerationParams, InferenceModel, ModelLoader, ModelRole, TurnRole};
    use parsbot_llm::ModelRegistry;
    use parsbot_text_processing::{CachedTranslator, LanguageDetector};
    use std::sync::Arc;
    use std::time::Duration;

    /// Echo model that can be told to fail on a given input or to stall
    struct Echo {
        tag: &'static str,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl InferenceModel for Echo {
        async fn generate(&self, input: &str, _params: &GenerationParams) -> Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if input.contains("explode") {
                return Err(Error::Inference("boom".to_string()));
            }
            Ok(format!("{}:{}", self.tag, input))
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    struct EchoLoader {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ModelLoader for EchoLoader {
        async fn load(&self, role: ModelRole) -> Result<Arc<dyn InferenceModel>> {
            let tag = match role {
                ModelRole::Dialogue => "bot",
                ModelRole::TranslateFaEn => "en",
                ModelRole::TranslateEnFa => "fa",
            };
            Ok(Arc::new(Echo {
                tag,
                delay: self.delay,
            }))
        }
    }

    fn conversation(config: ConversationConfig, delay: Option<Duration>) -> Conversation {
        let registry = Arc::new(ModelRegistry::new(Arc::new(EchoLoader { delay })));
        let chatbot = Chatbot::new(
            registry,
            LanguageDetector::default(),
            CachedTranslator::new(100, GenerationParams::default()),
        );
        Conversation::new(chatbot, config)
    }

    #[tokio::test]
    async fn test_successful_exchange_records_both_turns() {
        let convo = conversation(ConversationConfig::default(), None);

        let reply = convo.submit("Hello").await.unwrap();
        assert_eq!(reply, "bot:Hello");

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role(), TurnRole::User);
        assert_eq!(transcript[0].text(), "Hello");
        assert_eq!(transcript[1].role(), TurnRole::Bot);
        assert_eq!(transcript[1].text(), "bot:Hello");
        assert_eq!(convo.successful_exchanges(), 1);
        assert!(!convo.is_pending());
    }

    #[tokio::test]
    async fn test_empty_message_leaves_history_untouched() {
        let convo = conversation(ConversationConfig::default(), None);

        let err = convo.submit("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(convo.turn_count(), 0);
        assert_eq!(convo.successful_exchanges(), 0);
    }

    #[tokio::test]
    async fn test_failed_turn_has_no_bot_entry() {
        let convo = conversation(ConversationConfig::default(), None);

        let err = convo.submit("please explode").await.unwrap_err();
        assert!(matches!(err, Error::ResponseGeneration { .. }));

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role(), TurnRole::User);
        assert_eq!(convo.successful_exchanges(), 0);

        // The conversation keeps working
        assert!(convo.submit("Hello again").await.is_ok());
        assert_eq!(convo.turn_count(), 3);
    }

    #[tokio::test]
    async fn test_history_cap() {
        let config = ConversationConfig {
            history_limit: 6,
            ..ConversationConfig::default()
        };
        let convo = conversation(config, None);

        for i in 0..5 {
            convo.submit(&format!("message {}", i)).await.unwrap();
        }

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 6);
        assert_eq!(transcript[0].text(), "message 2");
        assert_eq!(transcript[5].text(), "bot:message 4");
    }

    #[tokio::test]
    async fn test_cache_cleared_every_interval() {
        let config = ConversationConfig {
            cache_clear_interval: 4,
            ..ConversationConfig::default()
        };
        let convo = conversation(config, None);

        convo.submit("سلام").await.unwrap();
        assert_eq!(convo.turns_appended(), 2);
        assert_eq!(convo.chatbot().cache_stats().clears, 0);
        assert!(convo.chatbot().cache_stats().size > 0);

        convo.submit("سلام").await.unwrap();
        assert_eq!(convo.turns_appended(), 4);
        let stats = convo.chatbot().cache_stats();
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test]
    async fn test_failed_turn_counts_toward_clear_interval() {
        let config = ConversationConfig {
            cache_clear_interval: 4,
            ..ConversationConfig::default()
        };
        let convo = conversation(config, None);

        convo.submit("Hello").await.unwrap();
        let _ = convo.submit("explode").await;
        assert_eq!(convo.turns_appended(), 3);
        assert_eq!(convo.chatbot().cache_stats().clears, 0);

        // Crossing happened at turn 4, acted on after the bot turn (turn 5)
        convo.submit("Hello").await.unwrap();
        assert_eq!(convo.turns_appended(), 5);
        assert_eq!(convo.chatbot().cache_stats().clears, 1);

        convo.submit("Hello").await.unwrap();
        assert_eq!(convo.chatbot().cache_stats().clears, 1);
        convo.submit("Hello").await.unwrap();
        assert_eq!(convo.turns_appended(), 9);
        assert_eq!(convo.chatbot().cache_stats().clears, 2);
        assert_eq!(convo.successful_exchanges(), 4);
    }

    #[tokio::test]
    async fn test_clear_interval_ignores_history_cap() {
        let config = ConversationConfig {
            history_limit: 2,
            cache_clear_interval: 4,
            ..ConversationConfig::default()
        };
        let convo = conversation(config, None);

        for _ in 0..4 {
            convo.submit("سلام").await.unwrap();
        }
        assert_eq!(convo.turn_count(), 2);
        assert_eq!(convo.turns_appended(), 8);
        assert_eq!(convo.chatbot().cache_stats().clears, 2);
    }

    #[tokio::test]
    async fn test_out_of_range_params_leave_history_untouched() {
        let convo = conversation(ConversationConfig::default(), None);
        convo.submit("Hello").await.unwrap();
        assert_eq!(convo.turn_count(), 2);

        for (max_length, num_beams) in [(128, 0), (0, 4), (usize::MAX, 1_000_000), (1025, 4)] {
            let err = convo
                .submit_with("Hi", max_length, num_beams)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        assert_eq!(convo.turn_count(), 2);
        assert_eq!(convo.turns_appended(), 2);
        assert_eq!(convo.transcript()[0].text(), "Hello");
        assert!(!convo.is_pending());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pending_while_generating_and_turns_serialized() {
        let convo = Arc::new(conversation(
            ConversationConfig::default(),
            Some(Duration::from_millis(50)),
        ));

        let first = {
            let convo = convo.clone();
            tokio::spawn(async move { convo.submit("first").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(convo.is_pending());

        let second = {
            let convo = convo.clone();
            tokio::spawn(async move { convo.submit("second").await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert!(!convo.is_pending());

        let texts: Vec<String> = convo
            .transcript()
            .iter()
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["first", "bot:first", "second", "bot:second"]);
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::default();
        settings.conversation.history_limit = 20;
        settings.generation.num_beams = 2;

        let config = ConversationConfig::from_settings(&settings);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.cache_clear_interval, 10);
        assert_eq!(config.max_length, 128);
        assert_eq!(config.num_beams, 2);
    }
}
