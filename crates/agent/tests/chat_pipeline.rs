//! End-to-end tests for the chat pipeline (detect -> translate -> dialogue -> translate)
//!
//! Models are in-process fakes bound through a custom loader, so these run
//! without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use parsbot_agent::{Chatbot, Conversation, ConversationConfig};
use parsbot_core::{
    Error, ErrorCategory, GenerationParams, InferenceModel, LanguageClassifier, ModelLoader,
    ModelRole, Result, TurnRole,
};
use parsbot_llm::{ModelRegistry, RegistryState};
use parsbot_text_processing::{CachedTranslator, LanguageDetector};

const PERSIAN_QUESTION: &str = "سلام، امروز هوا چطور است؟";

/// Fake model that logs its inputs and answers with a prefix
struct RecordingModel {
    prefix: &'static str,
    inputs: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new(prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            prefix,
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl InferenceModel for RecordingModel {
    async fn generate(&self, input: &str, _params: &GenerationParams) -> Result<String> {
        self.inputs.lock().push(input.to_string());
        Ok(format!("{}{}", self.prefix, input))
    }

    fn name(&self) -> &str {
        self.prefix
    }
}

#[derive(Clone)]
struct Models {
    dialogue: Arc<RecordingModel>,
    fa_en: Arc<RecordingModel>,
    en_fa: Arc<RecordingModel>,
    load_calls: Arc<AtomicUsize>,
    fail_on: Option<ModelRole>,
}

impl Models {
    fn new() -> Self {
        Self {
            dialogue: RecordingModel::new("reply: "),
            fa_en: RecordingModel::new("en: "),
            en_fa: RecordingModel::new("fa: "),
            load_calls: Arc::new(AtomicUsize::new(0)),
            fail_on: None,
        }
    }

    fn failing_on(role: ModelRole) -> Self {
        Self {
            fail_on: Some(role),
            ..Self::new()
        }
    }
}

#[async_trait]
impl ModelLoader for Models {
    async fn load(&self, role: ModelRole) -> Result<Arc<dyn InferenceModel>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(role) {
            return Err(Error::ModelLoad(format!("{}: weights not found", role)));
        }
        let model: Arc<dyn InferenceModel> = match role {
            ModelRole::Dialogue => self.dialogue.clone(),
            ModelRole::TranslateFaEn => self.fa_en.clone(),
            ModelRole::TranslateEnFa => self.en_fa.clone(),
        };
        Ok(model)
    }
}

/// Classifier that always reports Persian
struct AlwaysPersian {
    calls: AtomicUsize,
}

impl LanguageClassifier for AlwaysPersian {
    fn classify(&self, _text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("fa".to_string())
    }

    fn name(&self) -> &str {
        "always-fa"
    }
}

fn chatbot(models: &Models, detector: LanguageDetector) -> Chatbot {
    let registry = Arc::new(ModelRegistry::new(Arc::new(models.clone())));
    Chatbot::new(
        registry,
        detector,
        CachedTranslator::new(100, GenerationParams::default()),
    )
}

/// English input goes straight to the dialogue model
#[tokio::test]
async fn test_english_message_skips_translation() {
    let models = Models::new();
    let bot = chatbot(&models, LanguageDetector::default());

    let reply = bot.generate_response("Hello", 128, 4).await.unwrap();

    assert_eq!(reply, "reply: Hello");
    assert_eq!(models.dialogue.inputs(), vec!["Hello"]);
    assert!(models.fa_en.inputs().is_empty());
    assert!(models.en_fa.inputs().is_empty());
    assert_eq!(bot.registry_state(), RegistryState::Ready);
}

/// Long Persian input is classified statistically and translated both ways
#[tokio::test]
async fn test_persian_message_round_trips_through_english() {
    let models = Models::new();
    let classifier = Arc::new(AlwaysPersian {
        calls: AtomicUsize::new(0),
    });
    let detector = LanguageDetector::heuristic_only(10).with_classifier(classifier.clone());
    let bot = chatbot(&models, detector);

    let reply = bot
        .generate_response(PERSIAN_QUESTION, 128, 4)
        .await
        .unwrap();

    let english = format!("en: {}", PERSIAN_QUESTION);
    let dialogue_out = format!("reply: {}", english);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    assert_eq!(models.fa_en.inputs(), vec![PERSIAN_QUESTION.to_string()]);
    assert_eq!(models.dialogue.inputs(), vec![english]);
    assert_eq!(models.en_fa.inputs(), vec![dialogue_out.clone()]);
    assert_eq!(reply, format!("fa: {}", dialogue_out));
}

/// Empty input fails before the registry or the cache is touched
#[tokio::test]
async fn test_empty_message_rejected_up_front() {
    let models = Models::new();
    let bot = chatbot(&models, LanguageDetector::default());

    let err = bot.generate_response("", 128, 4).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::InvalidInput);
    assert_eq!(models.load_calls.load(Ordering::SeqCst), 0);
    assert_eq!(bot.registry_state(), RegistryState::Uninitialized);
    let stats = bot.cache_stats();
    assert_eq!(stats.hits + stats.misses, 0);
}

/// A load failure is reported as such and never leaves the registry ready
#[tokio::test]
async fn test_model_load_failure_is_terminal() {
    let models = Models::failing_on(ModelRole::TranslateEnFa);
    let bot = chatbot(&models, LanguageDetector::default());

    let err = bot.generate_response("Hello", 128, 4).await.unwrap_err();
    assert!(matches!(err, Error::ModelLoad(_)));
    assert_eq!(err.category(), ErrorCategory::GenerationFailed);
    assert_eq!(bot.registry_state(), RegistryState::Failed);
    assert!(!bot.registry().is_loaded());

    // Later calls see the same failure without reloading
    let loads = models.load_calls.load(Ordering::SeqCst);
    let again = bot.generate_response("Hello", 128, 4).await.unwrap_err();
    assert!(matches!(again, Error::ModelLoad(_)));
    assert_eq!(models.load_calls.load(Ordering::SeqCst), loads);
    assert!(models.dialogue.inputs().is_empty());
}

/// The tenth turn clears the cache, so the next user message misses
#[tokio::test]
async fn test_tenth_turn_clears_translation_cache() {
    let models = Models::new();
    let convo = Conversation::new(
        chatbot(&models, LanguageDetector::default()),
        ConversationConfig::default(),
    );

    for _ in 0..4 {
        convo.submit("سلام").await.unwrap();
    }
    assert_eq!(convo.turns_appended(), 8);
    assert_eq!(models.fa_en.inputs().len(), 1);
    assert_eq!(convo.chatbot().cache_stats().clears, 0);

    // Fifth exchange appends the tenth turn
    convo.submit("سلام").await.unwrap();
    assert_eq!(convo.turns_appended(), 10);
    assert_eq!(convo.chatbot().cache_stats().clears, 1);
    assert_eq!(models.fa_en.inputs().len(), 1);

    // Eleventh turn translates again
    convo.submit("سلام").await.unwrap();
    assert_eq!(models.fa_en.inputs().len(), 2);
    assert_eq!(convo.successful_exchanges(), 6);
}

/// The transcript alternates user and bot turns and stays within its cap
#[tokio::test]
async fn test_transcript_stays_bounded() {
    let models = Models::new();
    let convo = Conversation::new(
        chatbot(&models, LanguageDetector::default()),
        ConversationConfig::default(),
    );

    for i in 0..30 {
        convo.submit(&format!("question {}", i)).await.unwrap();
    }

    let transcript = convo.transcript();
    assert_eq!(transcript.len(), 50);
    assert_eq!(transcript[0].text(), "question 5");
    for pair in transcript.chunks(2) {
        assert_eq!(pair[0].role(), TurnRole::User);
        assert_eq!(pair[1].role(), TurnRole::Bot);
    }
}
