#![allow(dead_code)]

use axum::Router;
use chat_service::config::{ChatConfig, VertexSettings};
use chat_service::services::providers::ChatModel;
use chat_service::startup::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub fn static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

pub fn test_config() -> ChatConfig {
    ChatConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        vertex: VertexSettings {
            project_id: "test-project".to_string(),
            region: "us-central1".to_string(),
            model: "chat-bison@001".to_string(),
            api_endpoint: None,
            access_token: None,
            request_timeout_secs: 5,
        },
        static_dir: static_dir(),
    }
}

/// Router wired to the given model, for `oneshot` tests.
pub fn router(chat_model: Arc<dyn ChatModel>) -> Router {
    build_router(AppState { chat_model }, &static_dir())
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(chat_model: Arc<dyn ChatModel>) -> Self {
        let app = Application::build_with_model(test_config(), chat_model)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling the page
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Self { address, port }
    }
}
