// src/provider/mod.rs - Model backend exchange layer

pub mod ollama;
pub mod thinking;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infra::errors::ExchangeError;

/// Shown in place of a reply when the exchange fails.
pub const EXCHANGE_APOLOGY: &str =
    "Sorry, there was an error processing your request. Please ensure Ollama is running and try again.";

/// One network round trip: full history in, one assistant message out.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn exchange(&self, history: &[Message]) -> Result<Message, ExchangeError>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thinking: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            thinking: None,
        }
    }

    /// Build an assistant message from a raw reply, splitting off any
    /// reasoning segment.
    pub fn from_reply(raw: &str) -> Self {
        let split = thinking::split_thinking(raw);
        Self {
            role: Role::Assistant,
            content: split.content,
            thinking: split.thinking,
        }
    }

    /// The synthetic reply recorded when an exchange fails.
    pub fn apology() -> Self {
        Self::assistant(EXCHANGE_APOLOGY)
    }
}

/// A message as it goes over the wire. Reasoning is never sent back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, history: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: history.iter().map(WireMessage::from).collect(),
            stream: false,
        }
    }
}

/// Success body of `POST /api/chat`. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}
