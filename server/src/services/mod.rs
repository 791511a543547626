use chrono::{Local, NaiveDateTime};

pub mod analytics;
pub mod calendar;
pub mod events;
pub mod ical;
pub mod reminders;
pub mod store;
pub mod sweep;

pub use events::EventService;
pub use reminders::ReminderScheduler;
pub use store::{EventFilter, EventStore};
pub use sweep::spawn_status_sweep;

/// Current local wall-clock time; event dates carry no timezone.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
