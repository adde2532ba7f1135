//! Statistical language identification

use crate::Result;

/// Classifies text into a language code such as `"fa"` or `"en"`
///
/// Codes outside the supported set are allowed; callers decide how to treat them.
pub trait LanguageClassifier: Send + Sync + 'static {
    fn classify(&self, text: &str) -> Result<String>;

    fn name(&self) -> &str;
}
