//! Cached fa↔en translation
//!
//! Translation always goes through a [`LoadedModels`] handle set, which only a
//! ready model registry hands out. The cache therefore cannot be read or filled
//! before the translation models exist.

mod cache;

pub use cache::{CacheKey, CachePolicy, CacheStats, LruPolicy, TranslationCache};

use parsbot_config::TranslationConfig;
use parsbot_core::{Error, GenerationParams, LoadedModels, Result, TranslationDirection};

/// Translator that memoizes model output per `(text, direction)`
#[derive(Debug)]
pub struct CachedTranslator {
    cache: TranslationCache,
    params: GenerationParams,
}

impl CachedTranslator {
    /// LRU-backed translator
    pub fn new(cache_capacity: usize, params: GenerationParams) -> Self {
        Self::with_cache(TranslationCache::new(cache_capacity), params)
    }

    pub fn with_cache(cache: TranslationCache, params: GenerationParams) -> Self {
        Self { cache, params }
    }

    pub fn from_settings(config: &TranslationConfig) -> Self {
        Self::new(
            config.cache_capacity,
            GenerationParams::new(config.max_length, config.num_beams),
        )
    }

    /// Translate `text`, consulting the cache first
    ///
    /// On a miss the model for `direction` is called and its output stored
    /// before returning. Input longer than `max_length` words is truncated
    /// before it reaches the model; the cache key is always the full text.
    pub async fn translate(
        &self,
        models: &LoadedModels,
        text: &str,
        direction: TranslationDirection,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Cannot translate empty text".to_string()));
        }

        if let Some(hit) = self.cache.get(text, direction) {
            tracing::debug!(direction = %direction, "Translation cache hit");
            return Ok(hit);
        }

        let input = truncate_words(text, self.params.max_length);
        let model = models.translator(direction);
        let translated = model
            .generate(input, &self.params)
            .await
            .map_err(|e| Error::Translation(format!("{} via {}: {}", direction, model.name(), e)))?;

        tracing::debug!(
            direction = %direction,
            model = model.name(),
            truncated = input.len() < text.len(),
            "Translated text"
        );

        self.cache.insert(text, direction, translated.clone());
        Ok(translated)
    }

    /// Empty the cache unconditionally
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }
}

/// Keep at most `max_words` whitespace-separated words, as a prefix slice
fn truncate_words(text: &str, max_words: usize) -> &str {
    let mut words = 0;
    let mut in_word = false;
    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == max_words {
                return text[..index].trim_end();
            }
            words += 1;
            in_word = true;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parsbot_core::InferenceModel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Prefixes input with a tag and counts calls
    struct TaggingModel {
        tag: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl TaggingModel {
        fn new(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl InferenceModel for TaggingModel {
        async fn generate(&self, input: &str, _params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Inference("endpoint unreachable".to_string()));
            }
            Ok(format!("[{}] {}", self.tag, input))
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    fn models(fa_en: Arc<TaggingModel>, en_fa: Arc<TaggingModel>) -> LoadedModels {
        LoadedModels {
            dialogue: TaggingModel::new("dialogue"),
            translate_fa_en: fa_en,
            translate_en_fa: en_fa,
        }
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let fa_en = TaggingModel::new("fa_en");
        let models = models(fa_en.clone(), TaggingModel::new("en_fa"));
        let translator = CachedTranslator::new(100, GenerationParams::default());

        let first = translator
            .translate(&models, "سلام", TranslationDirection::FaEn)
            .await
            .unwrap();
        let second = translator
            .translate(&models, "سلام", TranslationDirection::FaEn)
            .await
            .unwrap();

        assert_eq!(first, "[fa_en] سلام");
        assert_eq!(first, second);
        assert_eq!(fa_en.calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_direction_selects_model() {
        let fa_en = TaggingModel::new("fa_en");
        let en_fa = TaggingModel::new("en_fa");
        let models = models(fa_en.clone(), en_fa.clone());
        let translator = CachedTranslator::new(100, GenerationParams::default());

        let out = translator
            .translate(&models, "Hi", TranslationDirection::EnFa)
            .await
            .unwrap();
        assert_eq!(out, "[en_fa] Hi");
        assert_eq!(fa_en.calls.load(Ordering::SeqCst), 0);
        assert_eq!(en_fa.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_forces_model_call() {
        let fa_en = TaggingModel::new("fa_en");
        let models = models(fa_en.clone(), TaggingModel::new("en_fa"));
        let translator = CachedTranslator::new(100, GenerationParams::default());

        translator
            .translate(&models, "سلام", TranslationDirection::FaEn)
            .await
            .unwrap();
        translator.clear();
        translator
            .translate(&models, "سلام", TranslationDirection::FaEn)
            .await
            .unwrap();

        assert_eq!(fa_en.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let fa_en = TaggingModel::failing("fa_en");
        let models = models(fa_en.clone(), TaggingModel::new("en_fa"));
        let translator = CachedTranslator::new(100, GenerationParams::default());

        let err = translator
            .translate(&models, "سلام", TranslationDirection::FaEn)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Translation(ref msg) if msg.contains("fa_en")));
        assert!(translator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let fa_en = TaggingModel::new("fa_en");
        let models = models(fa_en.clone(), TaggingModel::new("en_fa"));
        let translator = CachedTranslator::new(100, GenerationParams::default());

        let err = translator
            .translate(&models, "  ", TranslationDirection::FaEn)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(fa_en.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_long_input_truncated_but_keyed_in_full() {
        let fa_en = TaggingModel::new("fa_en");
        let models = models(fa_en.clone(), TaggingModel::new("en_fa"));
        let translator = CachedTranslator::new(100, GenerationParams::new(3, 4));

        let out = translator
            .translate(&models, "یک دو سه چهار پنج", TranslationDirection::FaEn)
            .await
            .unwrap();
        assert_eq!(out, "[fa_en] یک دو سه");
        assert!(translator
            .cache()
            .contains("یک دو سه چهار پنج", TranslationDirection::FaEn));
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("a b c", 5), "a b c");
        assert_eq!(truncate_words("a b c", 3), "a b c");
        assert_eq!(truncate_words("a  b   c d", 2), "a  b");
        assert_eq!(truncate_words("  lead trail  ", 1), "  lead");
        assert_eq!(truncate_words("", 2), "");
    }

    #[test]
    fn test_from_settings() {
        let translator = CachedTranslator::from_settings(&TranslationConfig::default());
        assert_eq!(translator.cache().capacity(), 100);
        assert_eq!(translator.params().max_length, 128);
        assert_eq!(translator.params().num_beams, 4);
        assert_eq!(translator.params().no_repeat_ngram_size, 2);
    }
}
