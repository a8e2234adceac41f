//! Assistant - the main listen/answer loop
//!
//! Greets once, then repeats capture cycles until the input source closes or
//! the process is interrupted.

use crate::session::{ConversationSession, Outcome};
use crate::voice::{SpeechInput, listen_with_retry};
use crate::{Error, Result};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input source has no more utterances (text mode EOF)
    InputClosed,
    /// Ctrl-C
    Interrupted,
}

/// Drives a [`ConversationSession`] from a [`SpeechInput`]
pub struct Assistant {
    session: ConversationSession,
    input: Box<dyn SpeechInput>,
    max_attempts: u32,
}

impl Assistant {
    #[must_use]
    pub fn new(
        session: ConversationSession,
        input: Box<dyn SpeechInput>,
        max_attempts: u32,
    ) -> Self {
        Self {
            session,
            input,
            max_attempts,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Run one capture cycle and hand the result to the session
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] when the input is exhausted, or any
    /// error from saving the history
    pub async fn step(&mut self) -> Result<Outcome> {
        let recognition = listen_with_retry(self.input.as_mut(), self.max_attempts).await?;
        self.session.handle(recognition).await
    }

    /// Greet, then loop until the input closes or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be saved or the audio device fails
    #[allow(clippy::future_not_send)]
    pub async fn run(mut self) -> Result<StopReason> {
        self.session.greet().await;
        tracing::info!(
            wake_word = %self.session.matcher().wake_word(),
            turns = self.session.history().len(),
            "waiting for wake word"
        );

        loop {
            let result = tokio::select! {
                _ = tokio::signal::ctrl_c() => None,
                result = self.step() => Some(result),
            };

            match result {
                None => {
                    tracing::info!(state = %self.session.state(), "interrupted");
                    return Ok(StopReason::Interrupted);
                }
                Some(Ok(outcome)) => {
                    tracing::debug!(?outcome, state = %self.session.state(), "cycle complete");
                }
                Some(Err(Error::InputClosed)) => {
                    tracing::info!("input closed");
                    return Ok(StopReason::InputClosed);
                }
                Some(Err(e)) => return Err(e),
            }
        }
    }
}
