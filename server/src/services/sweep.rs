use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::local_now;
use super::store::EventStore;
use crate::realtime::{Hub, ServerEvent};

/// Periodically recomputes stored statuses and pushes the full list when any changed.
pub fn spawn_status_sweep(store: EventStore, hub: Hub, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Some(events) = store.refresh_statuses(local_now()).await {
                tracing::info!(events = events.len(), "event statuses changed");
                hub.publish(ServerEvent::EventsStatusUpdate(events));
            }
        }
    })
}
