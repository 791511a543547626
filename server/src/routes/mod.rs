use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::events::{
    create_event, delete_event, events_in_range, export_event, get_event, list_events,
    update_event,
};
use crate::handlers::health_check;
use crate::handlers::socket::socket_handler;
use crate::handlers::stats::{attendance_overview, calendar_month, event_stats, monthly_distribution};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(socket_handler))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/range", get(events_in_range))
        .route("/api/events/export/:id", get(export_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/stats", get(event_stats))
        .route("/api/stats/monthly", get(monthly_distribution))
        .route("/api/stats/attendance", get(attendance_overview))
        .route("/api/calendar", get(calendar_month))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
