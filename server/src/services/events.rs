use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::broadcast;

use super::local_now;
use super::reminders::ReminderScheduler;
use super::store::{EventFilter, EventStore};
use crate::models::{Event, EventDraft, EventId, Notification};
use crate::realtime::{Hub, ServerEvent};
use crate::utils::error::AppError;

/// Calendar years an event may fall in; iCalendar dates have four-digit years.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Every mutation, from REST or the socket, goes through here so that both
/// surfaces broadcast the same frames and keep reminders in step.
#[derive(Clone)]
pub struct EventService {
    store: EventStore,
    hub: Hub,
    reminders: ReminderScheduler,
    invitation_delay: Duration,
    last_id: Arc<AtomicI64>,
}

impl EventService {
    pub fn new(
        store: EventStore,
        hub: Hub,
        reminders: ReminderScheduler,
        invitation_delay: Duration,
    ) -> Self {
        Self {
            store,
            hub,
            reminders,
            invitation_delay,
            last_id: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.hub.subscribe()
    }

    pub fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    pub async fn list(&self, filter: &EventFilter) -> Vec<Event> {
        self.store.list(filter, local_now()).await
    }

    pub async fn all(&self) -> Vec<Event> {
        self.list(&EventFilter::default()).await
    }

    pub async fn get(&self, id: EventId) -> Result<Event, AppError> {
        self.store
            .get(id, local_now())
            .await
            .ok_or_else(|| AppError::event_not_found(id))
    }

    pub async fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Event> {
        self.store.in_range(start, end, local_now()).await
    }

    pub async fn create(&self, draft: EventDraft) -> Result<Event, AppError> {
        validate_draft(&draft)?;
        let now = local_now();
        let id = match draft.id {
            Some(id) => id,
            None => self.next_id(),
        };
        let event = self.store.insert(draft.into_event(id, now)).await?;

        tracing::info!(event_id = event.id, title = %event.title, "event created");
        self.hub.publish(ServerEvent::EventCreated(event.clone()));
        self.announce_invitations(&event);
        self.reminders.schedule(&event, now);

        Ok(event)
    }

    pub async fn update(&self, id: EventId, draft: EventDraft) -> Result<Event, AppError> {
        validate_draft(&draft)?;
        let now = local_now();
        let event = self
            .store
            .replace(id, draft.into_event(id, now))
            .await
            .ok_or_else(|| AppError::event_not_found(id))?;

        tracing::info!(event_id = id, title = %event.title, "event updated");
        self.hub.publish(ServerEvent::EventUpdated(event.clone()));
        self.hub.publish(ServerEvent::EventNotification(
            Notification::event_updated(&event.title),
        ));
        self.reminders.schedule(&event, now);

        Ok(event)
    }

    pub async fn delete(&self, id: EventId) -> Result<Event, AppError> {
        let event = self
            .store
            .remove(id)
            .await
            .ok_or_else(|| AppError::event_not_found(id))?;

        tracing::info!(event_id = id, title = %event.title, "event deleted");
        self.reminders.cancel(id);
        self.hub.publish(ServerEvent::EventDeleted(id));
        self.hub.publish(ServerEvent::EventNotification(
            Notification::event_deleted(&event.title),
        ));

        Ok(event.with_status(local_now()))
    }

    /// Millisecond timestamp id, bumped past the last one handed out so
    /// creates within the same millisecond stay distinct.
    fn next_id(&self) -> EventId {
        let now_ms = Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now_ms.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(previous.saturating_add(1))
    }

    fn announce_invitations(&self, event: &Event) {
        if event.attendees.is_empty() {
            return;
        }

        let emails: Vec<String> = event.attendees.iter().map(|a| a.email.clone()).collect();
        let hub = self.hub.clone();
        let delay = self.invitation_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for email in emails {
                hub.publish(ServerEvent::EventNotification(Notification::invitation_sent(
                    &email,
                )));
            }
        });
    }
}

/// Rejects drafts that could not be scheduled or exported.
fn validate_draft(draft: &EventDraft) -> Result<(), AppError> {
    if !SUPPORTED_YEARS.contains(&draft.date.year()) {
        return Err(AppError::ValidationError(format!(
            "Event date {} is outside the supported range 0001-01-01 to 9999-12-31",
            draft.date
        )));
    }
    if let Some(attendee) = draft
        .attendees
        .iter()
        .find(|a| a.email.chars().any(char::is_control))
    {
        return Err(AppError::ValidationError(format!(
            "Attendee email {:?} contains control characters",
            attendee.email
        )));
    }
    Ok(())
}
