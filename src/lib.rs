//! Lami - wake-word voice assistant with persistent conversation memory
//!
//! Lami idles until it hears its name, then answers every question with a
//! Gemini model that sees the whole conversation so far. Saying an exit
//! phrase ends the conversation and writes the history to disk, so the next
//! conversation picks up where the last one left off.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                     Assistant                       │
//! │        capture cycle → session → speak reply        │
//! └───────┬───────────────────┬────────────────┬───────┘
//!         │                   │                │
//! ┌───────▼───────┐  ┌────────▼────────┐  ┌────▼───────────┐
//! │  SpeechInput  │  │     Session     │  │  SpeechOutput  │
//! │ mic+STT/stdin │  │ state, history, │  │ TTS+speaker/   │
//! └───────────────┘  │  phrase match   │  │ stdout         │
//!                    └────────┬────────┘  └────────────────┘
//!                    ┌────────▼────────┐
//!                    │  LanguageModel  │
//!                    │     Gemini      │
//!                    └─────────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod session;
pub mod voice;

pub use assistant::{Assistant, StopReason};
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{GeminiClient, LanguageModel};
pub use session::{
    ConversationHistory, ConversationSession, ConversationTurn, HistoryStore, Outcome,
    PhraseMatcher, Replies, Role, SessionState, Utterance,
};
