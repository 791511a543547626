use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;

use crate::models::{Event, EventId, EventStatus};
use crate::utils::error::AppError;

/// Title search and status filter applied to listings.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub search: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventFilter {
    fn matches(&self, event: &Event) -> bool {
        let title_matches = match &self.search {
            Some(term) => event.title.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        };
        let status_matches = self.status.map_or(true, |status| event.status == status);
        title_matches && status_matches
    }
}

/// In-memory event list shared by the REST and socket surfaces.
///
/// Reads hand out copies with statuses derived at the given instant; the
/// stored status only moves when [`EventStore::refresh_statuses`] runs.
#[derive(Clone, Default)]
pub struct EventStore {
    events: Arc<RwLock<Vec<Event>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, filter: &EventFilter, now: NaiveDateTime) -> Vec<Event> {
        let events = self.events.read().await;
        events
            .iter()
            .cloned()
            .map(|event| event.with_status(now))
            .filter(|event| filter.matches(event))
            .collect()
    }

    pub async fn get(&self, id: EventId, now: NaiveDateTime) -> Option<Event> {
        let events = self.events.read().await;
        events
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .map(|event| event.with_status(now))
    }

    /// Events whose date falls within `start..=end`.
    pub async fn in_range(&self, start: NaiveDate, end: NaiveDate, now: NaiveDateTime) -> Vec<Event> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|event| event.date >= start && event.date <= end)
            .cloned()
            .map(|event| event.with_status(now))
            .collect()
    }

    pub async fn insert(&self, event: Event) -> Result<Event, AppError> {
        let mut events = self.events.write().await;
        if events.iter().any(|existing| existing.id == event.id) {
            return Err(AppError::Conflict(format!(
                "Event {} already exists",
                event.id
            )));
        }
        events.push(event.clone());
        Ok(event)
    }

    /// Replaces the event stored under `id`, returning the new record.
    pub async fn replace(&self, id: EventId, mut event: Event) -> Option<Event> {
        let mut events = self.events.write().await;
        let slot = events.iter_mut().find(|existing| existing.id == id)?;
        event.id = id;
        *slot = event.clone();
        Some(event)
    }

    pub async fn remove(&self, id: EventId) -> Option<Event> {
        let mut events = self.events.write().await;
        let index = events.iter().position(|event| event.id == id)?;
        Some(events.remove(index))
    }

    /// Recomputes every stored status. Returns the full list when anything changed.
    pub async fn refresh_statuses(&self, now: NaiveDateTime) -> Option<Vec<Event>> {
        let mut events = self.events.write().await;
        let mut changed = false;
        for event in events.iter_mut() {
            changed |= event.refresh_status(now);
        }
        changed.then(|| events.clone())
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}
