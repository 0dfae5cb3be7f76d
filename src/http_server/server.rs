//! # HTTP Server
//!
//! Combines the catalog and observability routers, adds CORS and per-request
//! logging, and serves until the shutdown token is cancelled.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::catalog::Catalog;
use crate::observability::{Event, Logger, MetricsRegistry, Severity, Timer};
use crate::query::{QueryLimits, QueryPipeline};

use super::catalog_routes::catalog_routes;
use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;

// ==================
// Shared State
// ==================

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub pipeline: QueryPipeline,
    pub limits: QueryLimits,
    pub metrics: Arc<MetricsRegistry>,
    /// Root token; handlers derive a child per request
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(catalog: Catalog, limits: QueryLimits, shutdown: CancellationToken) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        Self {
            catalog,
            pipeline: QueryPipeline::new(Arc::clone(&metrics)),
            limits,
            metrics,
            shutdown,
        }
    }
}

// ==================
// Server
// ==================

pub struct HttpServer {
    config: HttpServerConfig,
    shutdown: CancellationToken,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let shutdown = state.shutdown.clone();
        let router = build_router(&config, state);
        Self {
            config,
            shutdown,
            router,
        }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until the shutdown token is cancelled, then drain connections
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr = listener.local_addr()?.to_string();
        Logger::info(Event::Serving.as_str(), &[("addr", &addr)]);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    }
}

/// Build the full application router
pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
    Router::new()
        .merge(observability_routes())
        .nest("/api/v1", catalog_routes())
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(config))
                .layer(middleware::from_fn_with_state(state.clone(), log_requests)),
        )
        .with_state(state)
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(config.cors_origins.iter().filter_map(|s| s.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let timer = Timer::new();

    let response = next.run(request).await;

    state.metrics.increment_http_requests();
    let status = response.status();
    let severity = if status.is_server_error() {
        Severity::Error
    } else if status.is_client_error() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(
        severity,
        Event::HttpRequest.as_str(),
        &[
            ("method", &method),
            ("path", &path),
            ("status", status.as_str()),
            ("duration_ms", &timer.elapsed_ms()),
        ],
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownValidator;

    fn state() -> AppState {
        AppState::new(
            Catalog::new(MarkdownValidator::default()),
            QueryLimits::default(),
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::new(HttpServerConfig::with_port(9090), state());
        assert_eq!(server.socket_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_pipeline_shares_state_metrics() {
        let state = state();
        state.metrics.increment_queries_executed();
        assert_eq!(state.pipeline.metrics().snapshot().queries_executed, 1);
    }

    #[test]
    fn test_router_builds_with_any_origin() {
        let config = HttpServerConfig {
            cors_origins: vec!["*".to_string()],
            ..HttpServerConfig::default()
        };
        let _router = HttpServer::new(config, state()).router();
    }
}
