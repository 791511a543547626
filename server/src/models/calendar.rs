use chrono::NaiveDate;
use serde::Serialize;

use super::event::{EventId, EventStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Sunday-first rows of seven cells; `None` pads days outside the month.
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub events: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    pub id: EventId,
    pub title: String,
    pub time: String,
    pub status: EventStatus,
}
