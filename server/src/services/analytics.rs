use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::stats::{AttendanceBreakdown, EventStats, MonthlyCount};
use crate::models::{AttendeeStatus, Event, EventStatus};

/// Number of most recent events shown in the attendance overview.
const ATTENDANCE_WINDOW: usize = 5;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Aggregates over `events`, whose statuses must already be current.
pub fn event_stats(events: &[Event]) -> EventStats {
    let count_status = |status| events.iter().filter(|e| e.status == status).count();

    EventStats {
        total_events: events.len(),
        upcoming_events: count_status(EventStatus::Upcoming),
        ongoing_events: count_status(EventStatus::Ongoing),
        completed_events: count_status(EventStatus::Completed),
        total_attendees: events.iter().map(|e| e.attendees.len()).sum(),
        average_attendance: average_attendance(events),
    }
}

/// Mean of each event's confirmed share, as a rounded percentage.
/// Events without attendees count as 0%.
pub fn average_attendance(events: &[Event]) -> u32 {
    if events.is_empty() {
        return 0;
    }

    let total: f64 = events
        .iter()
        .map(|event| {
            if event.attendees.is_empty() {
                0.0
            } else {
                event.count_attendees(AttendeeStatus::Confirmed) as f64
                    / event.attendees.len() as f64
            }
        })
        .sum();

    (total / events.len() as f64 * 100.0).round() as u32
}

/// Event counts per calendar month, across years, in calendar order.
pub fn monthly_counts(events: &[Event]) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.date.month0()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(month0, count)| MonthlyCount {
            month: MONTH_ABBREVIATIONS[month0 as usize].to_string(),
            count,
        })
        .collect()
}

pub fn attendance_overview(events: &[Event]) -> Vec<AttendanceBreakdown> {
    let skip = events.len().saturating_sub(ATTENDANCE_WINDOW);
    events
        .iter()
        .skip(skip)
        .map(|event| AttendanceBreakdown {
            event: event.title.clone(),
            confirmed: event.count_attendees(AttendeeStatus::Confirmed),
            pending: event.count_attendees(AttendeeStatus::Pending),
            declined: event.count_attendees(AttendeeStatus::Declined),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, EventDraft};
    use chrono::{NaiveDate, NaiveTime};

    fn event(id: i64, date: (i32, u32, u32), statuses: &[AttendeeStatus]) -> Event {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        EventDraft {
            id: Some(id),
            title: format!("Event {}", id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            location: String::new(),
            description: String::new(),
            attendees: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| Attendee {
                    id: i as f64,
                    email: format!("guest{}@example.com", i),
                    status: *status,
                })
                .collect(),
            notifications: vec![],
        }
        .into_event(id, now)
    }

    use AttendeeStatus::{Confirmed, Declined, Pending};

    #[test]
    fn test_average_attendance_is_mean_of_ratios() {
        let events = vec![
            event(1, (2024, 5, 1), &[Confirmed, Pending]),
            event(2, (2024, 7, 1), &[Confirmed, Confirmed, Confirmed, Declined]),
            event(3, (2024, 7, 2), &[Confirmed, Confirmed, Pending]),
        ];
        // (0.5 + 0.75 + 0.6667) / 3 = 0.6389
        assert_eq!(average_attendance(&events), 64);
    }

    #[test]
    fn test_average_attendance_edge_cases() {
        assert_eq!(average_attendance(&[]), 0);
        let events = vec![event(1, (2024, 5, 1), &[]), event(2, (2024, 5, 2), &[Confirmed])];
        assert_eq!(average_attendance(&events), 50);
    }

    #[test]
    fn test_event_stats_counts() {
        let events = vec![
            event(1, (2024, 5, 1), &[Confirmed, Pending]),
            event(2, (2024, 6, 1), &[Declined]),
            event(3, (2024, 9, 1), &[]),
        ];
        let stats = event_stats(&events);

        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.completed_events, 1);
        assert_eq!(stats.ongoing_events, 1);
        assert_eq!(stats.upcoming_events, 1);
        assert_eq!(stats.total_attendees, 3);
        assert_eq!(stats.average_attendance, 17);
    }

    #[test]
    fn test_monthly_counts_in_calendar_order() {
        let events = vec![
            event(1, (2024, 11, 3), &[]),
            event(2, (2024, 2, 3), &[]),
            event(3, (2025, 11, 20), &[]),
        ];
        let counts = monthly_counts(&events);
        assert_eq!(
            counts,
            vec![
                MonthlyCount { month: "Feb".into(), count: 1 },
                MonthlyCount { month: "Nov".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_attendance_overview_keeps_last_five() {
        let events: Vec<Event> = (1..=7)
            .map(|id| event(id, (2024, 5, id as u32), &[Confirmed, Pending, Declined]))
            .collect();
        let overview = attendance_overview(&events);

        assert_eq!(overview.len(), 5);
        assert_eq!(overview[0].event, "Event 3");
        assert_eq!(overview[4].confirmed, 1);
        assert_eq!(overview[4].declined, 1);
    }
}
