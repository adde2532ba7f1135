//! Centralized defaults
//!
//! Single source of truth for default values used by the settings structs and
//! by component constructors in other crates.

/// Generation defaults shared by the dialogue and translation models
pub mod generation {
    pub const MAX_LENGTH: usize = 128;
    pub const NUM_BEAMS: usize = 4;
    /// Hard upper bound accepted by validation
    pub const MAX_LENGTH_LIMIT: usize = 1024;
    pub const NUM_BEAMS_LIMIT: usize = 16;
}

/// Conversation bookkeeping
pub mod conversation {
    /// Maximum turns retained in a session's history
    pub const HISTORY_LIMIT: usize = 50;
    /// Clear the translation cache every N successful exchanges
    pub const CACHE_CLEAR_INTERVAL: usize = 10;
}

/// Translation cache
pub mod translation {
    pub const CACHE_CAPACITY: usize = 100;
}

/// Language detection
pub mod detection {
    /// Inputs must be longer than this (in characters) for the statistical path
    pub const MIN_STATISTICAL_LENGTH: usize = 10;
}

/// Default model bindings
pub mod models {
    pub const DIALOGUE: &str = "facebook/blenderbot_small-90M";
    pub const TRANSLATE_FA_EN: &str = "persiannlp/mt5-small-parsinlu-opus-translation_fa_en";
    pub const TRANSLATE_EN_FA: &str = "persiannlp/mt5-small-parsinlu-translation_en_fa";
    pub const ENDPOINT: &str = "https://api-inference.huggingface.co";
    pub const TIMEOUT_SECS: u64 = 60;
}

/// HTTP server
pub mod server {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8080;
    pub const MAX_SESSIONS: usize = 100;
    pub const SESSION_TIMEOUT_SECS: u64 = 3600;
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;
}
