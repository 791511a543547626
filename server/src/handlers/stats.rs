use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;

use crate::models::calendar::CalendarMonth;
use crate::models::stats::{AttendanceBreakdown, EventStats, MonthlyCount};
use crate::services::{analytics, calendar, local_now};
use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn event_stats(State(state): State<AppState>) -> Json<EventStats> {
    Json(analytics::event_stats(&state.events.all().await))
}

pub async fn monthly_distribution(State(state): State<AppState>) -> Json<Vec<MonthlyCount>> {
    Json(analytics::monthly_counts(&state.events.all().await))
}

pub async fn attendance_overview(State(state): State<AppState>) -> Json<Vec<AttendanceBreakdown>> {
    Json(analytics::attendance_overview(&state.events.all().await))
}

/// Month grid for the calendar view; defaults to the current month.
pub async fn calendar_month(
    State(state): State<AppState>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<CalendarMonth>, AppError> {
    let Query(query) = query?;
    let today = local_now().date();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let events = state.events.all().await;
    Ok(Json(calendar::month_grid(year, month, &events)?))
}
