//! The text-generation boundary.
//!
//! The engine never talks to a completion backend itself. Whatever relay
//! the embedding application uses (HTTP, local model, fixture files) is
//! presented to the core as a [`TextGenerator`], and failures surface as
//! [`GenerationError`] values with an optional transport status code.
//! Retry policy belongs to the relay, not to this crate.

use crate::errors::GenerationError;
use crate::persona::ReviewerPersona;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Who said a line of chat history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One turn of conversation history handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self {
            role: MessageRole::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.to_string(),
        }
    }
}

/// An opaque text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce one response in `persona`'s voice.
    async fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        system_prompt: &str,
        persona: &ReviewerPersona,
    ) -> Result<String, GenerationError>;
}

/// One canned reply for the scripted generator.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Failure { message: String, status: Option<u16> },
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            status: None,
        }
    }

    pub fn failure_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Failure {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// A [`TextGenerator`] that replays queued responses per persona.
///
/// Used by the test suite and by offline demos of the exercise. Each
/// `generate` call pops the next reply queued for that persona; an empty
/// queue is reported as a rejection, which exercises the same failure
/// path a dead backend would.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `persona_id`. Replies pop in FIFO order.
    pub async fn enqueue(&self, persona_id: &str, reply: ScriptedReply) {
        self.replies
            .lock()
            .await
            .entry(persona_id.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _history: &[Message],
        _system_prompt: &str,
        persona: &ReviewerPersona,
    ) -> Result<String, GenerationError> {
        let next = self
            .replies
            .lock()
            .await
            .get_mut(&persona.id)
            .and_then(VecDeque::pop_front);

        match next {
            Some(ScriptedReply::Text(content)) => Ok(content),
            Some(ScriptedReply::Failure { message, status }) => match status {
                Some(code) => Err(GenerationError::rejected_with_status(message, code)),
                None => Err(GenerationError::rejected(message)),
            },
            None => Err(GenerationError::rejected(format!(
                "no scripted reply queued for persona {}",
                persona.id
            ))),
        }
    }
}
