//! Bilingual chatbot orchestration
//!
//! - [`Chatbot`] turns one user message into one reply in the same language
//! - [`Conversation`] keeps the bounded transcript and the cache-clearing cadence

pub mod chatbot;
pub mod conversation;
pub mod history;

pub use chatbot::{check_generation_params, Chatbot};
pub use conversation::{Conversation, ConversationConfig};
pub use history::ConversationHistory;
