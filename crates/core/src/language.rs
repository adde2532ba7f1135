//! Language tags and translation directions

use serde::{Deserialize, Serialize};

/// Languages the chatbot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "fa")]
    Persian,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::Persian => "fa",
            Language::English => "en",
        }
    }

    /// English display name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Persian => "Persian",
            Language::English => "English",
        }
    }

    /// Parse an exact language code; anything but `fa` or `en` is `None`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "fa" => Some(Language::Persian),
            "en" => Some(Language::English),
            _ => None,
        }
    }

    /// Direction for translating this language into English, if any
    pub fn inbound_direction(&self) -> Option<TranslationDirection> {
        match self {
            Language::Persian => Some(TranslationDirection::FaEn),
            Language::English => None,
        }
    }

    /// Direction for translating an English reply back into this language
    pub fn outbound_direction(&self) -> Option<TranslationDirection> {
        match self {
            Language::Persian => Some(TranslationDirection::EnFa),
            Language::English => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Machine translation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationDirection {
    FaEn,
    EnFa,
}

impl TranslationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationDirection::FaEn => "fa_en",
            TranslationDirection::EnFa => "en_fa",
        }
    }

    pub fn source(&self) -> Language {
        match self {
            TranslationDirection::FaEn => Language::Persian,
            TranslationDirection::EnFa => Language::English,
        }
    }

    pub fn target(&self) -> Language {
        match self {
            TranslationDirection::FaEn => Language::English,
            TranslationDirection::EnFa => Language::Persian,
        }
    }
}

impl std::fmt::Display for TranslationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
