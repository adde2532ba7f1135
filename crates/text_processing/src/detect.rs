//! Persian/English language detection
//!
//! Two paths, tried in order:
//! 1. A statistical classifier, when one is attached and the input is longer than
//!    `min_statistical_length` characters. Its answer is used only if it is `fa`
//!    or `en`.
//! 2. A script heuristic: text is Persian when more than a quarter of its
//!    characters fall in the Arabic block (U+0600..U+06FF).
//!
//! If the classifier errors or panics the detector answers English.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parsbot_config::constants::detection;
use parsbot_config::DetectionConfig;
use parsbot_core::{Error, Language, LanguageClassifier, Result};

const PERSIAN_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// Classifies text as Persian or English
#[derive(Clone)]
pub struct LanguageDetector {
    classifier: Option<Arc<dyn LanguageClassifier>>,
    min_statistical_length: usize,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::heuristic_only(detection::MIN_STATISTICAL_LENGTH)
    }
}

impl LanguageDetector {
    /// Detector without a statistical classifier
    pub fn heuristic_only(min_statistical_length: usize) -> Self {
        Self {
            classifier: None,
            min_statistical_length,
        }
    }

    /// Build from settings, attaching the compiled-in classifier when enabled
    pub fn from_settings(config: &DetectionConfig) -> Self {
        let detector = Self::heuristic_only(config.min_statistical_length);

        if !config.statistical_enabled {
            return detector;
        }

        match compiled_classifier() {
            Some(classifier) => detector.with_classifier(classifier),
            None => {
                tracing::warn!("Statistical detection requested but not compiled in, using heuristic");
                detector
            },
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Detect the language of `text`
    ///
    /// Fails only for empty input. Every non-empty input yields `fa` or `en`.
    pub fn detect(&self, text: &str) -> Result<Language> {
        if text.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot detect language of empty text".to_string(),
            ));
        }

        let length = text.chars().count();
        if let Some(classifier) = &self.classifier {
            if length > self.min_statistical_length {
                match catch_unwind(AssertUnwindSafe(|| classifier.classify(text))) {
                    Ok(Ok(code)) => {
                        if let Some(language) = Language::from_code(code.trim()) {
                            tracing::debug!(
                                language = %language,
                                classifier = classifier.name(),
                                "Detected language (statistical)"
                            );
                            return Ok(language);
                        }
                        tracing::debug!(code = %code, "Unsupported classifier output, using heuristic");
                    },
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Language classifier failed, defaulting to English");
                        return Ok(Language::English);
                    },
                    Err(_) => {
                        tracing::warn!("Language classifier panicked, defaulting to English");
                        return Ok(Language::English);
                    },
                }
            }
        }

        let language = Self::heuristic(text);
        tracing::debug!(language = %language, "Detected language (heuristic)");
        Ok(language)
    }

    /// Script heuristic: Persian iff Persian-block characters exceed a quarter
    /// of all characters
    pub fn heuristic(text: &str) -> Language {
        let (total, persian) = text.chars().fold((0usize, 0usize), |(total, persian), c| {
            (total + 1, persian + PERSIAN_BLOCK.contains(&c) as usize)
        });

        if persian as f64 > total as f64 / 4.0 {
            Language::Persian
        } else {
            Language::English
        }
    }
}

#[cfg(feature = "statistical-detection")]
fn compiled_classifier() -> Option<Arc<dyn LanguageClassifier>> {
    Some(Arc::new(crate::WhatlangClassifier))
}

#[cfg(not(feature = "statistical-detection"))]
fn compiled_classifier() -> Option<Arc<dyn LanguageClassifier>> {
    None
}

impl std::fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("classifier", &self.classifier.as_ref().map(|c| c.name()))
            .field("min_statistical_length", &self.min_statistical_length)
            .finish()
    }
}
