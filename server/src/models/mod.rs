pub mod calendar;
pub mod event;
pub mod notification;
pub mod stats;

pub use event::{Attendee, AttendeeStatus, Event, EventDraft, EventId, EventStatus};
pub use notification::{Notification, NotificationKind, Reminder};
