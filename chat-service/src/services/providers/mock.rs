//! Mock provider implementation for testing.

use super::{ChatModel, ChatSession, GenerationParams, ProviderError};
use crate::models::{ChatMessage, ChatReply};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock answers every message.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Always the same text.
    Fixed(String),
    /// The user's message, unchanged.
    Echo,
    /// Fail with the given error.
    Fail(ProviderError),
}

/// One `send_message` call as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub session_id: String,
    pub message: String,
    pub params: GenerationParams,
}

/// Mock chat model for testing.
pub struct MockChatModel {
    enabled: bool,
    reply: MockReply,
    sessions_started: AtomicUsize,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockChatModel {
    pub fn new(reply: MockReply) -> Self {
        Self {
            enabled: true,
            reply,
            sessions_started: AtomicUsize::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockReply::Fixed(text.into()))
    }

    pub fn echo() -> Self {
        Self::new(MockReply::Echo)
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockReply::Fail(error))
    }

    /// A mock that reports itself unconfigured and refuses to open sessions.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::echo()
        }
    }

    /// Number of sessions opened so far.
    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }

    /// Every message sent so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock calls lock").clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_name(&self) -> &str {
        "mock-chat"
    }

    async fn start_chat(&self) -> Result<Box<dyn ChatSession>, ProviderError> {
        self.health_check().await?;

        let n = self.sessions_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockChatSession {
            id: format!("mock-session-{}", n),
            reply: self.reply.clone(),
            calls: self.calls.clone(),
            history: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock chat model not enabled".to_string(),
            ))
        }
    }
}

/// Session handed out by [`MockChatModel`].
pub struct MockChatSession {
    id: String,
    reply: MockReply,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    history: Vec<ChatMessage>,
}

#[async_trait]
impl ChatSession for MockChatSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    async fn send_message(
        &mut self,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ChatReply, ProviderError> {
        self.calls
            .lock()
            .expect("mock calls lock")
            .push(RecordedCall {
                session_id: self.id.clone(),
                message: message.to_string(),
                params: *params,
            });

        let text = match &self.reply {
            MockReply::Fixed(text) => text.clone(),
            MockReply::Echo => message.to_string(),
            MockReply::Fail(error) => return Err(error.clone()),
        };

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::model("mock", text.clone()));

        Ok(ChatReply::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_keeps_history_across_messages() {
        let model = MockChatModel::echo();
        let mut session = model.start_chat().await.unwrap();

        session
            .send_message("one", &GenerationParams::CHAT_DEFAULTS)
            .await
            .unwrap();
        session
            .send_message("two", &GenerationParams::CHAT_DEFAULTS)
            .await
            .unwrap();

        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[2], ChatMessage::user("two"));
        assert_eq!(model.sessions_started(), 1);
    }

    #[tokio::test]
    async fn disabled_mock_refuses_sessions() {
        let model = MockChatModel::disabled();
        assert!(model.start_chat().await.is_err());
        assert_eq!(model.sessions_started(), 0);
    }

    #[tokio::test]
    async fn failed_calls_are_still_recorded() {
        let model = MockChatModel::failing(ProviderError::RateLimited);

        for input in ["a", "b"] {
            let mut session = model.start_chat().await.unwrap();
            let err = session
                .send_message(input, &GenerationParams::CHAT_DEFAULTS)
                .await
                .unwrap_err();
            assert_eq!(err, ProviderError::RateLimited);
        }

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].message, "b");
        assert_ne!(calls[0].session_id, calls[1].session_id);
    }
}
