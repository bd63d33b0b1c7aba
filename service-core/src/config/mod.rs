use crate::error::AppError;
use config::{Config as Cfg, Environment, File, Map};
use serde::Deserialize;
use std::net::SocketAddr;

/// Server settings shared by every service.
///
/// Read from an optional `configuration` file and `APP__*` variables. The
/// bare `PORT` variable set by container platforms takes precedence.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_env(None)
    }

    /// Read from the process environment, or from `vars` when given.
    pub fn from_env(vars: Option<Map<String, String>>) -> Result<Self, AppError> {
        let port = match &vars {
            Some(vars) => vars.get("PORT").cloned(),
            None => std::env::var("PORT").ok(),
        };

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__").source(vars))
            .set_override_option("port", port)?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Socket address to bind the HTTP listener to.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "invalid bind address {}:{}: {}",
                    self.host,
                    self.port,
                    e
                ))
            })
    }
}
