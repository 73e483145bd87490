//! Application startup and lifecycle management.

use crate::config::{GeneratorBackend, GeneratorConfig, WeatherConfig};
use crate::handlers;
use crate::middleware::metrics_middleware;
use crate::services::providers::{
    CommandTextProvider, MockTextProvider, OllamaConfig, OllamaTextProvider, TextProvider,
};
use crate::services::{RecommendationCache, RiskScorer, SafetyAdvisor};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::{
    http_trace_layer, permissive_cors, request_id_middleware, security_headers_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: WeatherConfig,
    pub risk_scorer: RiskScorer,
    pub advisor: SafetyAdvisor,
}

/// Build the text provider selected by configuration.
pub fn build_provider(config: &GeneratorConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    let provider: Arc<dyn TextProvider> = match config.backend {
        GeneratorBackend::Command => {
            tracing::info!(
                program = %config.program,
                args = ?config.args,
                "Using command text provider"
            );
            Arc::new(CommandTextProvider::new(
                config.program.clone(),
                config.args.clone(),
                config.timeout(),
            ))
        }
        GeneratorBackend::Ollama => {
            tracing::info!(
                url = %config.ollama_url,
                model = %config.model,
                "Using Ollama HTTP text provider"
            );
            let provider = OllamaTextProvider::new(OllamaConfig {
                base_url: config.ollama_url.clone(),
                model: config.model.clone(),
                timeout: config.timeout(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            Arc::new(provider)
        }
        GeneratorBackend::Mock => {
            tracing::warn!("Using mock text provider");
            Arc::new(MockTextProvider::new(true))
        }
    };
    Ok(provider)
}

/// Assemble routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/extreme_weather", post(handlers::extreme_weather))
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route_layer(from_fn(metrics_middleware))
        .fallback(handlers::not_found)
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(permissive_cors())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: WeatherConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config.generator)?;
        Self::build_with_provider(config, provider).await
    }

    /// Build with an explicit text provider.
    pub async fn build_with_provider(
        config: WeatherConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let risk_scorer = RiskScorer::load_or_default(&config.model.path);

        let cache = if config.cache.enabled {
            tracing::info!(
                ttl_secs = config.cache.ttl_secs,
                max_entries = config.cache.max_entries,
                "Recommendation cache enabled"
            );
            Some(RecommendationCache::new(
                config.cache.ttl(),
                config.cache.max_entries,
            ))
        } else {
            None
        };

        let advisor = SafetyAdvisor::new(provider, config.generator.max_concurrent, cache);

        let state = AppState {
            config: config.clone(),
            risk_scorer,
            advisor,
        };

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Weather service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let http_router = router(self.state);

        axum::serve(self.http_listener, http_router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
