use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_events: usize,
    pub upcoming_events: usize,
    pub ongoing_events: usize,
    pub completed_events: usize,
    pub total_attendees: usize,
    /// Mean confirmed share per event, as a rounded percentage.
    pub average_attendance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceBreakdown {
    pub event: String,
    pub confirmed: usize,
    pub pending: usize,
    pub declined: usize,
}
