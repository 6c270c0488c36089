//! Chat types matching the client API surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hrychat_core::{Error, Result};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_CONVERSATION_TITLE: &str = "新对话";

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role/content pair handed to a content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Static reference record surfaced by citation extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl Message {
    /// Build an assistant reply stamped with the current time.
    pub fn assistant(id: String, content: String, citations: Option<Vec<Citation>>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content,
            created_at: Utc::now(),
            citations,
        }
    }
}

/// Incoming chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl ChatRequest {
    /// Reject parameters outside their documented ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Validation(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(Error::Validation("max_tokens must be positive".into()));
        }
        Ok(())
    }

    /// Conversation history as role/content pairs, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| ChatMessage::new(m.role, m.content.clone()))
            .collect()
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Sampling parameters forwarded to network providers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

/// One unit of the client-facing streaming protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub content: String,
    pub done: bool,
    /// Set only on the terminal chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Set only on the terminal chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ChatChunk {
    pub fn fragment(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
            message_id: None,
            citations: None,
        }
    }

    pub fn terminal(message_id: String, citations: Option<Vec<Citation>>) -> Self {
        Self {
            content: String::new(),
            done: true,
            message_id: Some(message_id),
            citations,
        }
    }
}

/// Payload of an in-band `error` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// A stored conversation. Updates replace the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_title() -> String {
    DEFAULT_CONVERSATION_TITLE.into()
}
