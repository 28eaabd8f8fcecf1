//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::store::EventStore;

pub use routes::create_router;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
}

impl AppState {
    pub fn new<S>(store: S) -> Self
    where
        S: EventStore + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build the application router with its middleware stack
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    // Layers run outside-in from the last one added:
    // request id -> timeout -> trace -> logging -> handler
    create_router()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Bind the HTTP listener; `host` may be an IP literal or a resolvable name
pub async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}
