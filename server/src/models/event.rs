use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Events are keyed by the millisecond timestamp the dashboard assigns on creation.
pub type EventId = i64;

/// Window before the start of an event during which it counts as ongoing.
const ONGOING_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl EventStatus {
    /// Derives the lifecycle stage of an event starting at `starts_at`, as seen at `now`.
    ///
    /// Both values are local wall-clock times. An event that has already started is
    /// completed; one starting within the next 24 hours is ongoing.
    pub fn derive(starts_at: NaiveDateTime, now: NaiveDateTime) -> Self {
        if starts_at < now {
            EventStatus::Completed
        } else if starts_at - now <= Duration::hours(ONGOING_WINDOW_HOURS) {
            EventStatus::Ongoing
        } else {
            EventStatus::Upcoming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            other => Err(format!("unknown event status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// The dashboard generates fractional ids, so this stays a plain number.
    #[serde(default)]
    pub id: f64,
    pub email: String,
    #[serde(default)]
    pub status: AttendeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub time: NaiveTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub status: EventStatus,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub notifications: Vec<serde_json::Value>,
}

impl Event {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn derived_status(&self, now: NaiveDateTime) -> EventStatus {
        EventStatus::derive(self.starts_at(), now)
    }

    /// Recomputes the stored status, returning whether it changed.
    pub fn refresh_status(&mut self, now: NaiveDateTime) -> bool {
        let status = self.derived_status(now);
        let changed = status != self.status;
        self.status = status;
        changed
    }

    pub fn with_status(mut self, now: NaiveDateTime) -> Self {
        self.refresh_status(now);
        self
    }

    pub fn count_attendees(&self, status: AttendeeStatus) -> usize {
        self.attendees.iter().filter(|a| a.status == status).count()
    }

    pub fn confirmed_attendees(&self) -> impl Iterator<Item = &Attendee> {
        self.attendees
            .iter()
            .filter(|a| a.status == AttendeeStatus::Confirmed)
    }
}

/// An event as submitted by a client. Any status it carries is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub id: Option<EventId>,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub time: NaiveTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub notifications: Vec<serde_json::Value>,
}

impl EventDraft {
    pub fn into_event(self, id: EventId, now: NaiveDateTime) -> Event {
        let status = EventStatus::derive(self.date.and_time(self.time), now);
        Event {
            id,
            title: self.title,
            date: self.date,
            time: self.time,
            location: self.location,
            description: self.description,
            status,
            attendees: self.attendees,
            notifications: self.notifications,
        }
    }
}

/// Parses a dashboard time field, `HH:MM` with optional seconds.
pub fn parse_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

mod wall_clock {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw)
            .map_err(|e| de::Error::custom(format!("invalid time '{}': {}", raw, e)))
    }
}
