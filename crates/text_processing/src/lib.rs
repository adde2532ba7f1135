//! Text processing for the bilingual chatbot
//!
//! This crate provides:
//! - **Language detection**: Persian/English classification with a statistical
//!   classifier (optional) and a script heuristic fallback
//! - **Translation**: fa↔en translation through the loaded models, memoized in a
//!   bounded cache with a pluggable eviction policy
//!
//! # Example
//!
//! ```ignore
//! use parsbot_text_processing::{CachedTranslator, LanguageDetector};
//!
//! let detector = LanguageDetector::default();
//! let lang = detector.detect("سلام، حالت چطوره؟")?;
//!
//! let translator = CachedTranslator::new(100, GenerationParams::default());
//! if let Some(direction) = lang.inbound_direction() {
//!     let english = translator.translate(&models, "سلام", direction).await?;
//! }
//! ```

pub mod detect;
#[cfg(feature = "statistical-detection")]
pub mod statistical;
pub mod translation;

pub use detect::LanguageDetector;
#[cfg(feature = "statistical-detection")]
pub use statistical::WhatlangClassifier;
pub use translation::{CacheKey, CachePolicy, CacheStats, CachedTranslator, LruPolicy, TranslationCache};
