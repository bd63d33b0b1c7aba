//! Chat turn model shared by every provider.

use serde::{Deserialize, Serialize};

/// Author tag the provider expects on user turns.
pub const USER_AUTHOR: &str = "user";

/// Author tag recorded for model turns when the provider leaves it blank.
pub const MODEL_AUTHOR: &str = "bot";

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the turn: `"user"` or the provider's model tag.
    pub author: String,

    /// Turn text.
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: USER_AUTHOR.to_string(),
            content: content.into(),
        }
    }

    pub fn model(author: impl Into<String>, content: impl Into<String>) -> Self {
        let author = author.into();
        Self {
            author: if author.is_empty() {
                MODEL_AUTHOR.to_string()
            } else {
                author
            },
            content: content.into(),
        }
    }
}

/// Text returned for a single `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Completion text. Empty when the provider blocked the candidate.
    pub text: String,

    /// Set when the provider's safety filter withheld the reply.
    pub blocked: bool,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocked: false,
        }
    }

    pub fn blocked() -> Self {
        Self {
            text: String::new(),
            blocked: true,
        }
    }
}
