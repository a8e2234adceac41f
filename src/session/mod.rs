//! Conversation session: the Dormant/Active state machine
//!
//! The session decides what every recognized utterance means, keeps the
//! running conversation history, and persists it when the user says goodbye.
//!
//! ```text
//!            wake word (ack)
//!   Dormant ─────────────────▶ Active ──┐ question (model reply)
//!      ▲                         │  ▲   │ unrecognized ("didn't catch that")
//!      │   exit phrase           │  └───┘
//!      └──(farewell + save)──────┘
//! ```

mod history;
mod phrases;
mod store;

use std::fmt;

pub use history::{ConversationHistory, ConversationTurn, Role};
pub use phrases::{PhraseMatcher, Utterance};
pub use store::HistoryStore;

use crate::Result;
use crate::llm::LanguageModel;
use crate::voice::{Recognition, SpeechOutput, clean_for_speech};

/// Whether the assistant is being addressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the wake word
    #[default]
    Dormant,
    /// In a conversation; every utterance is answered
    Active,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dormant => f.write_str("dormant"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Canned utterances the session speaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replies {
    /// Spoken once at startup
    pub greeting: String,
    /// Spoken on wake
    pub acknowledgement: String,
    /// Spoken on exit
    pub farewell: String,
    /// Spoken when nothing was recognized during a conversation
    pub not_understood: String,
    /// Spoken when the model call fails
    pub apology: String,
    /// Spoken when the model returns nothing
    pub clarify: String,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            greeting: "Lami is ready to assist. Say 'Lami' to activate.".to_string(),
            acknowledgement: "I'm listening. What would you like to ask?".to_string(),
            farewell: "Goodbye! I will wait for you to call Lami again.".to_string(),
            not_understood: "Sorry, I didn't catch that.".to_string(),
            apology: "Sorry, I couldn't get an answer right now. Please try again.".to_string(),
            clarify: "I didn't quite get that. Could you say it again?".to_string(),
        }
    }
}

/// What handling one recognition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not addressed to the assistant, or nothing heard while dormant
    Ignored,
    /// Wake word heard; the session is now active
    Activated,
    /// Wake word repeated during a conversation
    Swallowed,
    /// Nothing usable heard during a conversation
    NotUnderstood,
    /// The model answered and both turns were recorded
    Answered(String),
    /// The model answered with nothing; no turns recorded
    EmptyReply,
    /// The model call failed; only the user turn was recorded
    GenerationFailed,
    /// Exit phrase heard; history saved and the session is dormant again
    Ended,
}

/// Owns the conversation state and drives the collaborators for each utterance
pub struct ConversationSession {
    state: SessionState,
    history: ConversationHistory,
    matcher: PhraseMatcher,
    replies: Replies,
    announce_not_understood: bool,
    model: Box<dyn LanguageModel>,
    speaker: Box<dyn SpeechOutput>,
    store: HistoryStore,
}

impl ConversationSession {
    /// Create a dormant session, loading the persisted history
    ///
    /// # Errors
    ///
    /// Returns error if the history file exists but cannot be read
    pub fn new(
        matcher: PhraseMatcher,
        store: HistoryStore,
        model: Box<dyn LanguageModel>,
        speaker: Box<dyn SpeechOutput>,
    ) -> Result<Self> {
        let history = store.load()?;

        Ok(Self {
            state: SessionState::Dormant,
            history,
            matcher,
            replies: Replies::default(),
            announce_not_understood: true,
            model,
            speaker,
            store,
        })
    }

    /// Replace the canned replies
    #[must_use]
    pub fn with_replies(mut self, replies: Replies) -> Self {
        self.replies = replies;
        self
    }

    /// Whether to say "didn't catch that" when nothing was recognized mid-conversation
    #[must_use]
    pub const fn with_announce_not_understood(mut self, announce: bool) -> Self {
        self.announce_not_understood = announce;
        self
    }

    /// Current conversation state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Turns recorded so far, including those loaded at startup
    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Wake word and exit phrase vocabulary
    #[must_use]
    pub const fn matcher(&self) -> &PhraseMatcher {
        &self.matcher
    }

    /// Speak the startup greeting
    pub async fn greet(&mut self) {
        let greeting = self.replies.greeting.clone();
        self.say(&greeting).await;
    }

    /// Handle the result of one capture cycle
    ///
    /// # Errors
    ///
    /// Returns error only if saving the history fails; the session is
    /// dormant at that point and the farewell is not spoken
    pub async fn handle(&mut self, recognition: Recognition) -> Result<Outcome> {
        let utterance = match recognition {
            Recognition::Text(text) => self.matcher.classify(self.state, &text),
            Recognition::Timeout | Recognition::NotUnderstood | Recognition::ServiceError(_) => {
                Utterance::Unrecognized
            }
        };

        tracing::debug!(state = %self.state, utterance = ?utterance, "handling utterance");

        let outcome = match (self.state, utterance) {
            (SessionState::Dormant, Utterance::WakeWord) => {
                self.state = SessionState::Active;
                tracing::info!("wake word detected, conversation started");
                let ack = self.replies.acknowledgement.clone();
                self.say(&ack).await;
                Outcome::Activated
            }
            (SessionState::Dormant, _) => Outcome::Ignored,
            (SessionState::Active, Utterance::WakeWord) => Outcome::Swallowed,
            (SessionState::Active, Utterance::Unrecognized) => {
                if self.announce_not_understood {
                    let text = self.replies.not_understood.clone();
                    self.say(&text).await;
                }
                Outcome::NotUnderstood
            }
            (SessionState::Active, Utterance::ExitPhrase) => {
                self.state = SessionState::Dormant;
                tracing::info!(turns = self.history.len(), "exit phrase heard, conversation ended");
                // Saved before speaking so an interrupted farewell loses nothing
                self.store.save(&self.history)?;
                let farewell = self.replies.farewell.clone();
                self.say(&farewell).await;
                Outcome::Ended
            }
            (SessionState::Active, Utterance::Question(question)) => self.answer(question).await,
        };

        Ok(outcome)
    }

    /// Ask the model and record the exchange
    async fn answer(&mut self, question: String) -> Outcome {
        let user_turn = ConversationTurn::user(question);
        let prompt = self.history.format_with(Some(&user_turn));

        match self.model.generate(&prompt).await {
            Ok(reply) if reply.trim().is_empty() => {
                tracing::warn!(model = self.model.model_id(), "model returned an empty reply");
                let clarify = self.replies.clarify.clone();
                self.say(&clarify).await;
                Outcome::EmptyReply
            }
            Ok(reply) => {
                self.history.push(user_turn);
                self.history.push(ConversationTurn::model(reply.clone()));
                self.say(&reply).await;
                Outcome::Answered(reply)
            }
            Err(e) => {
                tracing::error!(model = self.model.model_id(), error = %e, "generation failed");
                // The question was asked; only the answer is missing
                self.history.push(user_turn);
                let apology = self.replies.apology.clone();
                self.say(&apology).await;
                Outcome::GenerationFailed
            }
        }
    }

    /// Speak cleaned text; a failing speaker is logged, never fatal
    async fn say(&mut self, text: &str) {
        let cleaned = clean_for_speech(text);
        tracing::info!(reply = %cleaned, "lami says");

        if let Err(e) = self.speaker.speak(&cleaned).await {
            tracing::warn!(error = %e, "speech output failed");
        }
    }
}
