use axum::{extract::State, response::IntoResponse, response::Response};
use serde::Serialize;

use crate::state::AppState;
use crate::utils::response::success;

pub mod events;
pub mod socket;
pub mod stats;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    events: usize,
    clients: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventsync-server",
        events: state.store.len().await,
        clients: state.hub.client_count(),
    };

    success(payload, "Health check successful").into_response()
}
