//! UI-agnostic conversation types
//!
//! These are the shapes the backend speaks (`GET /api/history` returns a list
//! of [`Message`]) and don't depend on any rendering surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
///
/// Anything the backend sends that isn't `"user"` is treated as the assistant,
/// including a missing, null or non-string role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum Role {
    User,
    #[default]
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

impl From<Value> for Role {
    fn from(v: Value) -> Self {
        match v.as_str() {
            Some("user") => Role::User,
            _ => Role::Assistant,
        }
    }
}
