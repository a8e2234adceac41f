//! Language model client
//!
//! The session only needs one call: send the formatted conversation, get the
//! reply text back. Providers implement [`LanguageModel`].

mod gemini;

use async_trait::async_trait;

pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiClient};

use crate::Result;

/// Generates a reply from the formatted conversation history
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logging
    fn model_id(&self) -> &str;

    /// Generate the next model reply
    ///
    /// `formatted_history` is every turn rendered as `role: content`, one per
    /// line, ending with the user turn being answered.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response carries no reply
    async fn generate(&self, formatted_history: &str) -> Result<String>;
}
