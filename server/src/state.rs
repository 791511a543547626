use std::sync::Arc;

use crate::config::Config;
use crate::realtime::Hub;
use crate::services::{EventService, EventStore, ReminderScheduler};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: EventStore,
    pub hub: Hub,
    pub events: EventService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = EventStore::new();
        let hub = Hub::new();
        let reminders = ReminderScheduler::new(store.clone(), hub.clone(), config.reminder_lead);
        let events = EventService::new(
            store.clone(),
            hub.clone(),
            reminders,
            config.invitation_delay,
        );

        Self {
            config: Arc::new(config),
            store,
            hub,
            events,
        }
    }
}
