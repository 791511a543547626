use serde::{Deserialize, Serialize};

use crate::models::{Event, EventDraft, EventId, Notification, Reminder};

/// Frames pushed to every connected dashboard, encoded as `{"event": .., "data": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    InitialEvents(Vec<Event>),
    EventCreated(Event),
    EventUpdated(Event),
    EventDeleted(EventId),
    EventNotification(Notification),
    EventReminder(Reminder),
    EventsStatusUpdate(Vec<Event>),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::InitialEvents(_) => "initialEvents",
            ServerEvent::EventCreated(_) => "eventCreated",
            ServerEvent::EventUpdated(_) => "eventUpdated",
            ServerEvent::EventDeleted(_) => "eventDeleted",
            ServerEvent::EventNotification(_) => "eventNotification",
            ServerEvent::EventReminder(_) => "eventReminder",
            ServerEvent::EventsStatusUpdate(_) => "eventsStatusUpdate",
        }
    }
}

/// Requests a dashboard sends over the socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateEvent(EventDraft),
    UpdateEvent(EventDraft),
    DeleteEvent(EventId),
}
