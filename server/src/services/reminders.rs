use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use tokio::task::AbortHandle;

use super::store::EventStore;
use crate::models::{Event, EventId, Reminder};
use crate::realtime::{Hub, ServerEvent};

struct Timer {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    armed: HashMap<EventId, Timer>,
}

/// One pending reminder per event, re-armed on update and cancelled on delete.
#[derive(Clone)]
pub struct ReminderScheduler {
    store: EventStore,
    hub: Hub,
    lead: chrono::Duration,
    timers: Arc<Mutex<Timers>>,
}

impl ReminderScheduler {
    pub fn new(store: EventStore, hub: Hub, lead: chrono::Duration) -> Self {
        Self {
            store,
            hub,
            lead,
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    /// Arms the reminder for `event`, replacing any earlier one.
    ///
    /// Returns `false` when the reminder time has already passed; nothing is armed then.
    pub fn schedule(&self, event: &Event, now: NaiveDateTime) -> bool {
        self.cancel(event.id);

        let Some(remind_at) = event.starts_at().checked_sub_signed(self.lead) else {
            tracing::warn!(event_id = event.id, "reminder time out of range, not scheduling");
            return false;
        };
        let Ok(delay) = (remind_at - now).to_std() else {
            tracing::debug!(event_id = event.id, "reminder time already passed, not scheduling");
            return false;
        };
        if delay.is_zero() {
            return false;
        }

        let mut timers = self.lock();
        let generation = timers.next_generation;
        timers.next_generation += 1;

        let scheduler = self.clone();
        let event_id = event.id;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.fire(event_id, generation).await;
        });

        timers.armed.insert(
            event_id,
            Timer {
                generation,
                handle: task.abort_handle(),
            },
        );
        tracing::debug!(event_id, delay_secs = delay.as_secs(), "reminder scheduled");
        true
    }

    pub fn cancel(&self, id: EventId) -> bool {
        match self.lock().armed.remove(&id) {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(event_id = id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.lock().armed.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.lock().armed.len()
    }

    async fn fire(&self, event_id: EventId, generation: u64) {
        {
            let mut timers = self.lock();
            match timers.armed.get(&event_id) {
                Some(timer) if timer.generation == generation => {
                    timers.armed.remove(&event_id);
                }
                // Superseded by a newer schedule or cancelled
                _ => return,
            }
        }

        let Some(event) = self.store.get(event_id, super::local_now()).await else {
            return;
        };

        let mut sent = 0;
        for attendee in event.confirmed_attendees() {
            self.hub.publish(ServerEvent::EventReminder(Reminder {
                event_id,
                attendee_email: attendee.email.clone(),
                message: format!(
                    "Reminder: \"{}\" is happening tomorrow at {}",
                    event.title,
                    event.time.format("%H:%M")
                ),
            }));
            sent += 1;
        }
        tracing::info!(event_id, reminders = sent, "event reminders sent");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timers> {
        // Timer bookkeeping never panics while holding the lock
        self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, AttendeeStatus, EventDraft};
    use crate::services::local_now;
    use chrono::Duration;
    use tokio::sync::broadcast::error::TryRecvError;

    fn attendee(email: &str, status: AttendeeStatus) -> Attendee {
        Attendee {
            id: 0.0,
            email: email.to_string(),
            status,
        }
    }

    fn event_starting_in(id: EventId, offset: Duration) -> Event {
        let starts_at = local_now() + offset;
        EventDraft {
            id: Some(id),
            title: "Board meeting".to_string(),
            date: starts_at.date(),
            time: starts_at.time(),
            location: String::new(),
            description: String::new(),
            attendees: vec![
                attendee("yes@example.com", AttendeeStatus::Confirmed),
                attendee("maybe@example.com", AttendeeStatus::Pending),
                attendee("also@example.com", AttendeeStatus::Confirmed),
            ],
            notifications: vec![],
        }
        .into_event(id, local_now())
    }

    fn setup() -> (EventStore, Hub, ReminderScheduler) {
        let store = EventStore::new();
        let hub = Hub::new();
        let scheduler = ReminderScheduler::new(store.clone(), hub.clone(), Duration::hours(24));
        (store, hub, scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_fires_for_confirmed_attendees() {
        let (store, hub, scheduler) = setup();
        let mut rx = hub.subscribe();
        let event = event_starting_in(1, Duration::hours(24) + Duration::minutes(5));
        store.insert(event.clone()).await.unwrap();

        assert!(scheduler.schedule(&event, local_now()));
        assert!(scheduler.is_scheduled(1));

        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;

        let mut emails = Vec::new();
        while let Ok(ServerEvent::EventReminder(reminder)) = rx.try_recv() {
            assert_eq!(reminder.event_id, 1);
            assert!(reminder.message.starts_with("Reminder: \"Board meeting\""));
            emails.push(reminder.attendee_email);
        }
        assert_eq!(emails, vec!["yes@example.com", "also@example.com"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_reminder_time_is_not_scheduled() {
        let (_store, _hub, scheduler) = setup();
        let event = event_starting_in(2, Duration::hours(3));

        assert!(!scheduler.schedule(&event, local_now()));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_reminder_never_fires() {
        let (store, hub, scheduler) = setup();
        let mut rx = hub.subscribe();
        let event = event_starting_in(3, Duration::hours(24) + Duration::minutes(1));
        store.insert(event.clone()).await.unwrap();

        scheduler.schedule(&event, local_now());
        assert!(scheduler.cancel(3));
        assert!(!scheduler.cancel(3));

        tokio::time::sleep(std::time::Duration::from_secs(5 * 60)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_the_earlier_timer() {
        let (store, hub, scheduler) = setup();
        let mut rx = hub.subscribe();
        let event = event_starting_in(4, Duration::hours(24) + Duration::minutes(1));
        store.insert(event.clone()).await.unwrap();
        scheduler.schedule(&event, local_now());

        let moved = event_starting_in(4, Duration::days(5));
        store.replace(4, moved.clone()).await.unwrap();
        assert!(scheduler.schedule(&moved, local_now()));
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(std::time::Duration::from_secs(5 * 60)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(scheduler.is_scheduled(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_at_edge_of_date_range_is_skipped() {
        let (_store, _hub, scheduler) = setup();
        let mut event = event_starting_in(5, Duration::days(3));
        event.date = chrono::NaiveDate::MIN;

        assert!(!scheduler.schedule(&event, local_now()));
        assert_eq!(scheduler.pending(), 0);
    }
}
