//! `WseventsServer`: Axum HTTP + WebSocket server around the hub.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::handlers::HandlerRegistry;
use crate::health::{self, HealthResponse};
use crate::hub::Hub;
use crate::shutdown::ServeHandle;
use crate::websocket::connection::Connection;
use crate::websocket::transport::split_socket;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the hub control loop.
    pub hub: Hub,
    /// Per-name event handlers run before broadcast.
    pub handlers: Arc<HandlerRegistry>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The main wsevents server.
pub struct WseventsServer {
    config: Arc<ServerConfig>,
    handlers: Arc<HandlerRegistry>,
    hub: Hub,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl WseventsServer {
    /// Create a new server and spawn its hub.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig, handlers: HandlerRegistry) -> Self {
        let (hub, _hub_task) = Hub::spawn(config.intake_capacity);
        Self {
            config: Arc::new(config),
            handlers: Arc::new(handlers),
            hub,
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: self.hub.clone(),
            handlers: self.handlers.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        let mut router = Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler));

        if let Some(dir) = &self.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        router.with_state(state).layer(TraceLayer::new_for_http())
    }

    /// Bind `host:port` and serve until the returned handle shuts it down.
    ///
    /// Returns the bound address (useful with port `0`) and the serve handle.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, ServeHandle)> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = CancellationToken::new();
        let signal = token.clone();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        });

        info!(%addr, "wsevents server listening");
        Ok((addr, ServeHandle::new(token, task)))
    }

    /// Get the hub handle.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the handler registry.
    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }
}

/// GET /ws
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let connections = match state.hub.connection_count().await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "rejecting upgrade");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };
    if connections >= state.config.max_connections {
        warn!(connections, max = state.config.max_connections, "connection limit reached");
        return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
    }

    let outbound_capacity = state.config.outbound_capacity;
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let (stream, sink) = split_socket(socket);
            let _teardown = Connection::new(state.hub, state.handlers, outbound_capacity)
                .run(stream, sink)
                .await;
        })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    match health::health_check(state.start_time, &state.hub).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            error!(error = %e, "health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
