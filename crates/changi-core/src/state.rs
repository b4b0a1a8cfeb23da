//! UI-agnostic chat state types
//!
//! These types are shared between the widget controller and whatever surface
//! renders it (terminal, test doubles) and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// A single rendered message in the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Header label shown above the message body
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Changi Assistant",
        }
    }
}

/// Request state, shown on the single-line status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Pending,
    Error,
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Status::Idle => "Ready to assist you!",
            Status::Pending => "Changi Assistant is thinking...",
            Status::Error => "Error occurred. Please try again.",
        }
    }
}
