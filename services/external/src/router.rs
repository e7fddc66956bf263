use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use dari_core::health::{healthz, readyz};
use dari_core::middleware::request_id_layer;

use crate::handlers::reports::{submit_device_info, submit_device_status, submit_disaster_result};
use crate::handlers::ws::ws_handler;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Reports
        .route("/api/reports/device-info", post(submit_device_info))
        .route("/api/reports/device-status", post(submit_device_status))
        .route("/api/reports/disaster-result", post(submit_disaster_result))
        // Subscriber socket
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
