//! Bearer token sources for the Vertex AI API.

use crate::services::providers::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::Secret;
use serde::Deserialize;

/// Default metadata server base URL on GCE / Cloud Run.
pub const METADATA_SERVER_BASE: &str = "http://metadata.google.internal";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Supplies OAuth access tokens for outbound provider calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError>;
}

/// A token fixed at startup, e.g. from `gcloud auth print-access-token`.
pub struct StaticToken {
    token: Secret<String>,
}

impl StaticToken {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError> {
        Ok(self.token.clone())
    }
}

/// Ambient service-account credentials from the instance metadata server.
///
/// A token is fetched for every call; the metadata server caches on its side.
pub struct MetadataServerToken {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

impl MetadataServerToken {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, METADATA_SERVER_BASE)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn token_url(&self) -> String {
        format!("{}{}", self.base_url, METADATA_TOKEN_PATH)
    }
}

#[async_trait]
impl TokenSource for MetadataServerToken {
    async fn access_token(&self) -> Result<Secret<String>, ProviderError> {
        let response = self
            .client
            .get(self.token_url())
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                ProviderError::NotConfigured(format!("metadata server unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Unauthorized(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let body: MetadataTokenResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("metadata token response: {}", e))
        })?;

        Ok(Secret::new(body.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn static_token_returns_configured_value() {
        let source = StaticToken::new(Secret::new("abc".to_string()));
        let token = source.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "abc");
    }

    #[test]
    fn token_url_strips_trailing_slash() {
        let source = MetadataServerToken::with_base_url(Client::new(), "http://127.0.0.1:9/");
        assert_eq!(
            source.token_url(),
            "http://127.0.0.1:9/computeMetadata/v1/instance/service-accounts/default/token"
        );
    }
}
