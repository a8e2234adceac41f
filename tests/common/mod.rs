//! Shared test utilities
//!
//! Scripted stand-ins for the microphone, the speaker, and the model. Each
//! fake keeps its log behind an `Arc<Mutex<_>>` so the test can inspect it
//! after the fake has been boxed into a session.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lami::session::{ConversationSession, HistoryStore, PhraseMatcher};
use lami::voice::{Recognition, SpeechInput, SpeechOutput};
use lami::{Error, LanguageModel, Result};

/// Records everything it is asked to say
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
    stall_on: Option<String>,
}

impl RecordingSpeaker {
    /// A speaker whose every call fails after recording the text
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// A speaker that never finishes saying `text`
    #[must_use]
    pub fn stalling_on(text: &str) -> Self {
        Self {
            stall_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl SpeechOutput for RecordingSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.stall_on.as_deref() == Some(text) {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(Error::Tts("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Returns queued replies in order and records every prompt it receives
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    #[must_use]
    pub fn replying(replies: &[&str]) -> Self {
        let model = Self::default();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, formatted_history: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push(formatted_history.to_string());

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(Error::Generation(message)),
            None => Err(Error::Generation("no scripted reply left".to_string())),
        }
    }
}

/// Yields queued recognitions, then reports the input as closed
#[derive(Default)]
pub struct ScriptedInput {
    queue: VecDeque<Recognition>,
}

impl ScriptedInput {
    #[must_use]
    pub fn new(items: Vec<Recognition>) -> Self {
        Self {
            queue: items.into(),
        }
    }

    /// Every item is recognized text
    #[must_use]
    pub fn saying(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| text(l)).collect())
    }
}

#[async_trait(?Send)]
impl SpeechInput for ScriptedInput {
    async fn listen(&mut self) -> Result<Recognition> {
        self.queue.pop_front().ok_or(Error::InputClosed)
    }
}

#[must_use]
pub fn text(s: &str) -> Recognition {
    Recognition::Text(s.to_string())
}

/// Build a "lami" session over the history file at `path`
pub fn session_at(
    path: &Path,
    model: &ScriptedModel,
    speaker: &RecordingSpeaker,
) -> ConversationSession {
    let matcher = PhraseMatcher::new(
        "lami",
        vec!["bye".to_string(), "exit".to_string(), "no thanks".to_string()],
    )
    .expect("valid matcher");

    ConversationSession::new(
        matcher,
        HistoryStore::new(path),
        Box::new(model.clone()),
        Box::new(speaker.clone()),
    )
    .expect("failed to create session")
}
