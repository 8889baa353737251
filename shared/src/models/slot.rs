//! 时段值类型
//!
//! [`TimeSlot`] 在每次可用性查询时重新生成，从不落库。

use serde::{Deserialize, Serialize};

/// A bookable time-of-day slot
///
/// `time` is the canonical 24-hour `HH:MM` key used everywhere bookings and
/// blocked slots refer to a slot; `display` is the 12-hour human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub display: String,
}

/// One day in the calendar overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOverview {
    /// Calendar day (YYYY-MM-DD)
    pub date: String,
    /// Weekday name, lowercase ("monday" .. "sunday")
    pub day_of_week: String,
    pub is_open: bool,
    /// "08:00 - 18:00" or "Closed"
    pub business_hours: String,
    /// Remaining open slots (only present for open days)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_slots: Option<usize>,
    /// Total slots the day geometry yields (only present for open days)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_slots: Option<usize>,
}
