//! Statistical language identification backed by `whatlang`

use parsbot_core::{Error, LanguageClassifier, Result};
use whatlang::Lang;

/// Trigram-based classifier
///
/// Persian and English map to `fa` and `en`. Any other language is reported by
/// its ISO 639-3 code, which the detector treats as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangClassifier;

impl LanguageClassifier for WhatlangClassifier {
    fn classify(&self, text: &str) -> Result<String> {
        let info = whatlang::detect(text)
            .ok_or_else(|| Error::Detection("No language features found".to_string()))?;

        let code = match info.lang() {
            Lang::Pes => "fa",
            Lang::Eng => "en",
            other => other.code(),
        };
        Ok(code.to_string())
    }

    fn name(&self) -> &str {
        "whatlang"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_and_persian() {
        let classifier = WhatlangClassifier;
        assert_eq!(
            classifier
                .classify("The weather is lovely today and I want to go for a walk in the park.")
                .unwrap(),
            "en"
        );
        assert_eq!(
            classifier
                .classify("امروز هوا خیلی خوب است و می‌خواهم در پارک قدم بزنم.")
                .unwrap(),
            "fa"
        );
    }

    #[test]
    fn test_no_features_is_error() {
        assert!(WhatlangClassifier.classify("12345 !!! ...").is_err());
    }
}
