//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path and method
//! - Wire up middleware (CORS, request ID, tracing, panics)
//! - Bind server to listener, plain or TLS
//! - Adapt axum requests into InboundRequest and map results to responses
//!
//! # Design Decisions
//! - The body limit and the request deadline are enforced in the handler,
//!   so their failures use the same JSON error body as every other one

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::error::{error_response, RelayError, MSG_PROXY_FAILED};
use crate::forward::ForwardError;
use crate::http::request::{request_id, InboundRequest, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::relay::Relay;
use crate::security::cors_layer;

/// Time allowed for in-flight TLS connections to finish after shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub max_body_size: usize,
    pub deadline: Option<Duration>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ForwardError> {
        let config = Arc::new(config);
        let state = AppState {
            relay: Relay::new(config.clone())?,
            max_body_size: config.limits.max_body_size,
            deadline: config.limits.request_timeout_secs.map(Duration::from_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(cors_layer(&config.cors))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();

        let drain = handle.clone();
        tokio::spawn(async move {
            wait_for_shutdown(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        tracing::info!(address = %addr, "HTTPS server starting");

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Relay handler: every method, every path.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();

    let relayed = async {
        let inbound = InboundRequest::read(request, state.max_body_size).await?;
        state.relay.handle(inbound).await
    };

    // Dropping the future on expiry cancels the upstream call.
    let result = match state.deadline {
        Some(deadline) => tokio::time::timeout(deadline, relayed)
            .await
            .unwrap_or(Err(RelayError::DeadlineExceeded(deadline))),
        None => relayed.await,
    };

    match result {
        Ok(envelope) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                upstream_status = envelope.status(),
                "Request relayed"
            );
            metrics::record_request(&method, StatusCode::OK.as_u16(), "forwarded");
            envelope.into_response()
        }
        Err(err) => {
            log_rejection(&request_id, &method, &err);
            metrics::record_request(&method, err.status().as_u16(), err.outcome());
            err.into_response()
        }
    }
}

fn log_rejection(request_id: &str, method: &str, err: &RelayError) {
    match err {
        RelayError::AuthenticationFailed => {
            tracing::warn!(request_id = %request_id, method = %method, "Rejected: invalid API key");
        }
        RelayError::Target(cause) => {
            tracing::warn!(request_id = %request_id, method = %method, error = %cause, "Rejected target");
        }
        RelayError::Forward(cause) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                kind = cause.kind(),
                error = %cause,
                "Upstream request failed"
            );
        }
        RelayError::PayloadTooLarge { limit } => {
            tracing::warn!(request_id = %request_id, method = %method, limit, "Rejected: body too large");
        }
        RelayError::DeadlineExceeded(deadline) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                deadline_secs = deadline.as_secs(),
                "Request deadline exceeded"
            );
        }
        RelayError::Internal(detail) => {
            tracing::error!(request_id = %request_id, method = %method, error = %detail, "Relay failed");
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(error = %detail, "Handler panicked");

    error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_PROXY_FAILED)
}

// A closed channel means the coordinator is gone; stop as well.
async fn wait_for_shutdown(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
    tracing::info!("Shutdown requested");
}
