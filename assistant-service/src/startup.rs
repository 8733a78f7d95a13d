//! Application startup and lifecycle management.
//!
//! Builds the chat providers from configuration, wires the HTTP routes and
//! runs the server until a shutdown signal arrives.

use crate::config::AssistantConfig;
use crate::handlers;
use crate::services::metrics::init_metrics;
use crate::services::providers::openai::OpenAiCompatibleProvider;
use crate::services::providers::ChatProvider;
use crate::services::{ProductAnalyzer, ServiceRouter};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors::cors_layer,
    tracing::{make_request_span, request_id_middleware},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// JSON bodies for `/ask` are small.
const ASK_BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AssistantConfig,
    pub analyzer: ProductAnalyzer,
    pub router: ServiceRouter,
}

impl AppState {
    /// Assemble state around already-built providers. `ask_provider` is
    /// ignored when the LLM fallback is disabled.
    pub fn new(
        config: AssistantConfig,
        vision_provider: Arc<dyn ChatProvider>,
        ask_provider: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        let analyzer = ProductAnalyzer::new(vision_provider, &config.analysis);
        let ask_provider = ask_provider.filter(|_| config.ask.llm_fallback);
        let router = ServiceRouter::new(ask_provider, config.ask.timeout());

        Self {
            config,
            analyzer,
            router,
        }
    }

    /// Build the OpenAI-compatible providers described by `config`.
    pub fn from_config(config: AssistantConfig) -> Result<Self, AppError> {
        let vision_provider: Arc<dyn ChatProvider> = Arc::new(build_provider(&config.openai)?);

        let ask_provider: Option<Arc<dyn ChatProvider>> = match config.ask_provider() {
            Some(settings) if settings.name == config.openai.name => Some(vision_provider.clone()),
            Some(settings) => Some(Arc::new(build_provider(settings)?)),
            None => None,
        };

        tracing::info!(
            vision_model = %config.openai.model,
            ask_provider = ask_provider.as_ref().map(|p| p.name()).unwrap_or("none"),
            llm_fallback = config.ask.llm_fallback,
            layout = ?config.analysis.layout,
            "Initialized chat providers"
        );

        Ok(Self::new(config, vision_provider, ask_provider))
    }
}

fn build_provider(
    settings: &crate::config::ProviderSettings,
) -> Result<OpenAiCompatibleProvider, AppError> {
    OpenAiCompatibleProvider::new(settings).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to create HTTP client for {}: {}",
            settings.name,
            e
        ))
    })
}

/// HTTP routes with the middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    let analyze_routes = Router::new()
        .route("/analyze", post(handlers::analyze::analyze_images))
        .route("/api/analyze", post(handlers::analyze::analyze_images))
        .layer(DefaultBodyLimit::max(state.config.analysis.max_upload_bytes));

    let ask_routes = Router::new()
        .route("/ask", post(handlers::ask::ask))
        .layer(DefaultBodyLimit::max(ASK_BODY_LIMIT));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .merge(analyze_routes)
        .merge(ask_routes)
        .route_layer(from_fn(handlers::metrics::track_http_metrics))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| make_request_span(request),
        ))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with real providers from `config`.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::build_with_state(state).await
    }

    /// Bind the listener for prepared state (port 0 = random port for testing).
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        init_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Assistant service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
