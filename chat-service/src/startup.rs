//! Application startup and lifecycle management.
//!
//! Builds the provider client once, wires it into the router and runs the
//! HTTP server until a shutdown signal arrives.

use crate::config::ChatConfig;
use crate::handlers::{
    chat::palm2,
    health::{health_check, readiness_check},
};
use crate::services::credentials::{MetadataServerToken, StaticToken, TokenSource};
use crate::services::providers::vertex::VertexChatModel;
use crate::services::providers::ChatModel;
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, RequestId,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_model: Arc<dyn ChatModel>,
}

/// Build the full router: page, assets, chat endpoint and health checks.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/palm2", get(palm2).post(palm2))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %RequestId::of(request),
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Pick the credential source: a configured token wins over the metadata server.
fn token_source(config: &ChatConfig) -> Arc<dyn TokenSource> {
    match &config.vertex.access_token {
        Some(token) => {
            tracing::info!("Using static Vertex AI access token");
            Arc::new(StaticToken::new(token.clone()))
        }
        None => {
            tracing::info!("Using metadata server credentials");
            Arc::new(MetadataServerToken::new(reqwest::Client::new()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the Vertex AI provider.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let provider_config = config.vertex.provider_config();
        let chat_model = VertexChatModel::new(provider_config, token_source(&config))
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        tracing::info!(
            project = %config.vertex.project_id,
            region = %config.vertex.region,
            model = %config.vertex.model,
            "Initialized Vertex AI chat model"
        );

        Self::build_with_model(config, Arc::new(chat_model)).await
    }

    /// Build the application around an already constructed chat model.
    pub async fn build_with_model(
        config: ChatConfig,
        chat_model: Arc<dyn ChatModel>,
    ) -> Result<Self, AppError> {
        if !config.static_dir.join("index.html").is_file() {
            tracing::warn!(
                static_dir = %config.static_dir.display(),
                "index.html not found; / will return 404"
            );
        }

        let router = build_router(AppState { chat_model }, &config.static_dir);

        // Port 0 = random port for testing
        let addr = config.common.bind_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Chat service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
