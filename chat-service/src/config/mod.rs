use crate::services::providers::vertex::{VertexConfig, DEFAULT_CHAT_MODEL};
use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, Environment, Map};
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default outbound timeout for provider calls, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default directory holding `index.html` and its assets, relative to the
/// workspace root.
const DEFAULT_STATIC_DIR: &str = "chat-service/static";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub vertex: VertexSettings,
    pub static_dir: PathBuf,
}

/// Vertex AI settings, read from `VERTEX__*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct VertexSettings {
    pub project_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Static bearer token. When unset the metadata server is used.
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl VertexSettings {
    /// Deserialize from any prepared builder.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let settings: VertexSettings = builder.build()?.try_deserialize()?;

        if settings.request_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "VERTEX__REQUEST_TIMEOUT_SECS must be greater than zero"
            )));
        }

        Ok(settings)
    }

    pub fn provider_config(&self) -> VertexConfig {
        VertexConfig {
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            model: self.model.clone(),
            api_endpoint: self.api_endpoint.clone().filter(|e| !e.is_empty()),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

impl ChatConfig {
    /// Load from `.env`, the process environment and the optional
    /// `configuration` file.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::assemble(common, None)
    }

    /// Load from an explicit set of variables instead of the process
    /// environment.
    pub fn from_env(vars: Map<String, String>) -> Result<Self, AppError> {
        let common = core_config::Config::from_env(Some(vars.clone()))?;
        Self::assemble(common, Some(vars))
    }

    fn assemble(
        common: core_config::Config,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, AppError> {
        let static_dir = match &vars {
            Some(vars) => vars.get("STATIC_DIR").cloned(),
            None => env::var("STATIC_DIR").ok(),
        }
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let vertex = VertexSettings::from_builder(
            Cfg::builder().add_source(
                Environment::with_prefix("VERTEX")
                    .separator("__")
                    .source(vars),
            ),
        )?;

        Ok(ChatConfig {
            common,
            vertex,
            static_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};
    use secrecy::ExposeSecret;

    fn settings(toml: &str) -> Result<VertexSettings, AppError> {
        VertexSettings::from_builder(
            Cfg::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let settings = settings(r#"project_id = "demo""#).unwrap();

        assert_eq!(settings.region, "us-central1");
        assert_eq!(settings.model, "chat-bison@001");
        assert!(settings.access_token.is_none());

        let provider = settings.provider_config();
        assert_eq!(provider.request_timeout, Duration::from_secs(120));
        assert!(provider.api_endpoint.is_none());
    }

    #[test]
    fn project_id_is_required() {
        assert!(matches!(
            settings(r#"region = "europe-west4""#),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(settings("project_id = \"demo\"\nrequest_timeout_secs = 0").is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert(key.to_string(), value.to_string());
        }
        map
    }

    #[test]
    fn environment_variables_fill_every_section() {
        let config = ChatConfig::from_env(vars(&[
            ("APP__HOST", "127.0.0.1"),
            ("APP__PORT", "9100"),
            ("PORT", "3000"),
            ("VERTEX__PROJECT_ID", "demo"),
            ("VERTEX__REGION", "europe-west4"),
            ("VERTEX__API_ENDPOINT", "http://127.0.0.1:4000"),
            ("VERTEX__ACCESS_TOKEN", "token-from-env"),
            ("VERTEX__REQUEST_TIMEOUT_SECS", "30"),
            ("STATIC_DIR", "/srv/static"),
        ]))
        .unwrap();

        assert_eq!(config.common.host, "127.0.0.1");
        assert_eq!(config.common.port, 3000);
        assert_eq!(config.static_dir, PathBuf::from("/srv/static"));

        assert_eq!(config.vertex.project_id, "demo");
        assert_eq!(config.vertex.region, "europe-west4");
        assert_eq!(config.vertex.model, "chat-bison@001");
        assert_eq!(
            config
                .vertex
                .access_token
                .as_ref()
                .map(|token| token.expose_secret().as_str()),
            Some("token-from-env")
        );

        let provider = config.vertex.provider_config();
        assert_eq!(provider.request_timeout, Duration::from_secs(30));
        assert_eq!(provider.api_endpoint.as_deref(), Some("http://127.0.0.1:4000"));
    }

    #[test]
    fn environment_defaults_apply() {
        let config = ChatConfig::from_env(vars(&[("VERTEX__PROJECT_ID", "demo")])).unwrap();

        assert_eq!(config.common.port, 8080);
        assert_eq!(config.static_dir, PathBuf::from("chat-service/static"));
        assert!(config.vertex.access_token.is_none());
    }

    #[test]
    fn missing_project_in_environment_is_rejected() {
        assert!(matches!(
            ChatConfig::from_env(vars(&[("VERTEX__REGION", "us-east1")])),
            Err(AppError::ConfigError(_))
        ));
    }
}
