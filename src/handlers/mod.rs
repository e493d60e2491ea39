//! HTTP handlers for solswap

mod health;
mod swap;

pub use health::*;
pub use swap::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_router, MetricsState};

/// Build the service router
pub fn router(swap_state: Arc<SwapState>, metrics: Arc<MetricsState>) -> Router {
    let swap_routes = Router::new()
        .route("/swap", post(swap_handler))
        .with_state(swap_state);

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(HealthState::new()));

    Router::new()
        .merge(swap_routes)
        .merge(health_routes)
        .merge(metrics_router().with_state(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
