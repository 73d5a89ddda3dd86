// src/chat/session.rs - Chat session records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::{Message, Role};

/// Title shown until the first user message arrives.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Titles keep this many characters of the first message.
pub const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message. The first user message names the session.
    pub fn push(&mut self, message: Message) {
        if self.messages.is_empty() && message.role == Role::User {
            self.title = title_from(&message.content);
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// First 30 characters of `text`, with "..." when anything was cut.
pub fn title_from(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// What the session list shows for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub active: bool,
    pub message_count: usize,
}
