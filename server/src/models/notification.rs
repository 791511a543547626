use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

/// A human-readable notice shown on every connected dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub time: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            message: message.into(),
            kind,
            time: now,
        }
    }

    pub fn invitation_sent(email: &str) -> Self {
        Self::new(NotificationKind::Info, format!("Invitation sent to {}", email))
    }

    pub fn event_updated(title: &str) -> Self {
        Self::new(
            NotificationKind::Success,
            format!("Event \"{}\" has been updated", title),
        )
    }

    pub fn event_deleted(title: &str) -> Self {
        Self::new(
            NotificationKind::Warning,
            format!("Event \"{}\" has been deleted", title),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub event_id: EventId,
    pub attendee_email: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_shape() {
        let notice = Notification::event_deleted("Offsite");
        let value = serde_json::to_value(&notice).unwrap();

        assert_eq!(value["type"], "warning");
        assert_eq!(value["message"], "Event \"Offsite\" has been deleted");
        assert!(value["time"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_reminder_uses_camel_case() {
        let reminder = Reminder {
            event_id: 42,
            attendee_email: "a@example.com".to_string(),
            message: "soon".to_string(),
        };
        let value = serde_json::to_value(&reminder).unwrap();
        assert_eq!(value["eventId"], 42);
        assert_eq!(value["attendeeEmail"], "a@example.com");
    }
}
