//! Vertex AI PaLM 2 chat provider.
//!
//! Talks to the `predict` endpoint of a `chat-bison` publisher model. The
//! model is stateless server-side, so each session resends its full history.

use super::{ChatModel, ChatSession, GenerationParams, ProviderError};
use crate::models::{ChatMessage, ChatReply};
use crate::services::credentials::TokenSource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default PaLM 2 chat model.
pub const DEFAULT_CHAT_MODEL: &str = "chat-bison@001";

/// Vertex provider configuration.
#[derive(Debug, Clone)]
pub struct VertexConfig {
    pub project_id: String,
    pub region: String,
    pub model: String,
    /// Base URL override. Defaults to the regional endpoint.
    pub api_endpoint: Option<String>,
    pub request_timeout: Duration,
}

impl VertexConfig {
    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> String {
        match &self.api_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.region),
        }
    }

    /// Full `predict` URL for the configured model.
    pub fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.endpoint(),
            self.project_id,
            self.region,
            self.model
        )
    }
}

/// PaLM 2 chat model client. Cheap to share; holds one HTTP client.
pub struct VertexChatModel {
    config: VertexConfig,
    client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl VertexChatModel {
    pub fn new(config: VertexConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }
}

#[async_trait]
impl ChatModel for VertexChatModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn start_chat(&self) -> Result<Box<dyn ChatSession>, ProviderError> {
        self.health_check().await?;

        Ok(Box::new(VertexChatSession {
            id: Uuid::new_v4().to_string(),
            url: self.config.predict_url(),
            client: self.client.clone(),
            tokens: self.tokens.clone(),
            history: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.project_id.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Vertex project id not configured".to_string(),
            ));
        }
        if self.config.region.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Vertex region not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// One PaLM 2 conversation.
pub struct VertexChatSession {
    id: String,
    url: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
    history: Vec<ChatMessage>,
}

impl VertexChatSession {
    fn build_request(&self, message: &str, params: &GenerationParams) -> PredictRequest {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(message));

        PredictRequest {
            instances: vec![ChatInstance { messages }],
            parameters: PredictParameters {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        }
    }
}

#[async_trait]
impl ChatSession for VertexChatSession {
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
        let request = self.build_request(message, params);
        let token = self.tokens.access_token().await?;

        tracing::debug!(
            session_id = %self.id,
            message_len = message.len(),
            history_len = self.history.len(),
            "Sending request to Vertex AI"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::Unauthorized(format!("Vertex AI {}: {}", status, error_text))
                }
                _ => ProviderError::ApiError(format!("Vertex AI error {}: {}", status, error_text)),
            });
        }

        let api_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let (reply, author) = extract_reply(api_response)?;

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::model(author, reply.text.clone()));

        Ok(reply)
    }
}

/// Pull the first candidate out of a predict response.
fn extract_reply(response: PredictResponse) -> Result<(ChatReply, String), ProviderError> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("no predictions returned".to_string()))?;

    let blocked = prediction
        .safety_attributes
        .map(|attrs| attrs.into_vec().iter().any(|a| a.blocked))
        .unwrap_or(false);

    match prediction.candidates.into_iter().next() {
        Some(candidate) if !blocked => Ok((ChatReply::text(candidate.content), candidate.author)),
        _ if blocked => {
            tracing::warn!("Vertex AI safety filter blocked the reply");
            Ok((ChatReply::blocked(), String::new()))
        }
        _ => Err(ProviderError::InvalidResponse(
            "prediction carried no candidates".to_string(),
        )),
    }
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<ChatInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct ChatInstance {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    safety_attributes: Option<OneOrMany<SafetyAttributes>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    author: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct SafetyAttributes {
    #[serde(default)]
    blocked: bool,
}

/// Chat models return one safety entry per candidate; text models return a
/// single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}
