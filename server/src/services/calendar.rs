use chrono::{Datelike, NaiveDate};

use crate::models::calendar::{CalendarDay, CalendarEntry, CalendarMonth};
use crate::models::Event;
use crate::utils::error::AppError;

const DAYS_PER_WEEK: usize = 7;

/// Lays out `year`/`month` as Sunday-first weeks with each day's events sorted by time.
pub fn month_grid(year: i32, month: u32, events: &[Event]) -> Result<CalendarMonth, AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        AppError::ValidationError(format!("Invalid calendar month {}-{}", year, month))
    })?;
    let days_in_month = days_in_month(first);
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<CalendarDay>> = vec![None; leading];
    for date in first.iter_days().take(days_in_month as usize) {
        let mut day_events: Vec<&Event> = events.iter().filter(|e| e.date == date).collect();
        day_events.sort_by_key(|e| e.time);

        cells.push(Some(CalendarDay {
            day: date.day(),
            date,
            events: day_events
                .into_iter()
                .map(|e| CalendarEntry {
                    id: e.id,
                    title: e.title.clone(),
                    time: e.time.format("%H:%M").to_string(),
                    status: e.status,
                })
                .collect(),
        }));
    }
    while cells.len() % DAYS_PER_WEEK != 0 {
        cells.push(None);
    }

    Ok(CalendarMonth {
        year,
        month,
        month_name: first.format("%B").to_string(),
        weeks: cells.chunks(DAYS_PER_WEEK).map(<[_]>::to_vec).collect(),
    })
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|n| n.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventDraft;
    use chrono::NaiveTime;

    fn event(id: i64, date: NaiveDate, time: (u32, u32)) -> Event {
        EventDraft {
            id: Some(id),
            title: format!("Event {}", id),
            date,
            time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            location: String::new(),
            description: String::new(),
            attendees: vec![],
            notifications: vec![],
        }
        .into_event(id, date.and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn test_may_2024_layout() {
        // 1 May 2024 was a Wednesday
        let grid = month_grid(2024, 5, &[]).unwrap();

        assert_eq!(grid.month_name, "May");
        assert_eq!(grid.weeks.len(), 5);
        assert!(grid.weeks.iter().all(|week| week.len() == 7));
        assert!(grid.weeks[0][..3].iter().all(Option::is_none));
        assert_eq!(grid.weeks[0][3].as_ref().unwrap().day, 1);
        assert_eq!(grid.weeks[4][5].as_ref().unwrap().day, 31);
        assert!(grid.weeks[4][6].is_none());
    }

    #[test]
    fn test_events_are_placed_and_sorted() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let events = vec![
            event(1, day, (15, 0)),
            event(2, day, (9, 30)),
            event(3, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), (9, 0)),
        ];
        let grid = month_grid(2024, 2, &events).unwrap();

        let cell = grid
            .weeks
            .iter()
            .flatten()
            .flatten()
            .find(|d| d.day == 29)
            .unwrap();
        let ids: Vec<_> = cell.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(cell.events[0].time, "09:30");

        let placed: usize = grid.weeks.iter().flatten().flatten().map(|d| d.events.len()).sum();
        assert_eq!(placed, 2);
    }

    #[test]
    fn test_december_rolls_over() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()), 28);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(matches!(
            month_grid(2024, 13, &[]),
            Err(AppError::ValidationError(_))
        ));
    }
}
