use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{EventDraft, EventId, EventStatus};
use crate::services::{ical, EventFilter};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{calendar_attachment, created};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<EventFilter, AppError> {
        let search = self.search.filter(|term| !term.trim().is_empty());
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(raw.parse::<EventStatus>().map_err(AppError::ValidationError)?),
        };
        Ok(EventFilter { search, status })
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let events = state.events.list(&query.into_filter()?).await;
    Ok(Json(events).into_response())
}

pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(draft) = payload?;
    let event = state.events.create(draft).await?;
    Ok(created(event))
}

pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    Ok(Json(state.events.get(id).await?).into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    id: Result<Path<EventId>, PathRejection>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(draft) = payload?;
    Ok(Json(state.events.update(id, draft).await?).into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    Ok(Json(state.events.delete(id).await?).into_response())
}

pub async fn events_in_range(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let start = parse_date("start", query.start.as_deref())?;
    let end = parse_date("end", query.end.as_deref())?;
    Ok(Json(state.events.in_range(start, end).await).into_response())
}

pub async fn export_event(
    State(state): State<AppState>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let event = state.events.get(id).await?;
    let body = ical::render_event(&event, Utc::now());
    Ok(calendar_attachment(body, &ical::attachment_filename(&event.title)))
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("Missing '{}' date", name)))?;

    // Accept full timestamps too; only the calendar date matters
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError(format!("Invalid '{}' date '{}', expected YYYY-MM-DD", name, raw))
    })
}
