//! Chat model provider abstractions and implementations.
//!
//! A [`ChatModel`] is the process-wide provider client, built once at startup.
//! Each request asks it for a fresh [`ChatSession`], sends one message and
//! drops the session.

pub mod mock;
pub mod vertex;

use crate::models::{ChatMessage, ChatReply};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<ProviderError> for AppError {
    /// Provider details stay in the logs; clients only see a generic message.
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => AppError::TooManyRequests(
                "The language model is busy, try again later".to_string(),
                None,
            ),
            ProviderError::NotConfigured(_) | ProviderError::Unauthorized(_) => {
                AppError::ServiceUnavailable
            }
            ProviderError::ApiError(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::NetworkError(_) => {
                AppError::BadGateway("language model request failed".to_string())
            }
        }
    }
}

/// Sampling controls sent with every message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 1.0).
    pub temperature: f32,

    /// Maximum output tokens.
    pub max_output_tokens: u32,

    /// Nucleus sampling threshold.
    pub top_p: f32,

    /// Top-k candidate count.
    pub top_k: u32,
}

impl GenerationParams {
    /// Parameters used for every chat request. Never derived from user input.
    pub const CHAT_DEFAULTS: Self = Self {
        temperature: 0.2,
        max_output_tokens: 256,
        top_p: 0.8,
        top_k: 40,
    };
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::CHAT_DEFAULTS
    }
}

/// Provider client able to open conversations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Open a new, empty conversation.
    async fn start_chat(&self) -> Result<Box<dyn ChatSession>, ProviderError>;

    /// Local configuration check. Does not call the provider.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// A single conversation with the provider.
///
/// Sessions keep their own history, so a second message on the same session
/// carries the first one as context.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Identifier unique to this session.
    fn id(&self) -> &str;

    /// Turns exchanged so far.
    fn history(&self) -> &[ChatMessage];

    /// Send a user message and wait for the reply.
    async fn send_message(
        &mut self,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ChatReply, ProviderError>;
}
