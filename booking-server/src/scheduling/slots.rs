//! 时段生成器
//!
//! 纯函数：从营业时间和时段时长推导一天的候选时段序列。
//! 每次调用重新物化，不产生 I/O，不落库。

use chrono::{Datelike, NaiveDate};
use shared::models::TimeSlot;

use crate::core::config::ScheduleConfig;

/// Generate the ordered candidate slots for a calendar date.
///
/// Closed weekdays yield an empty list; this is the only representation of
/// "closed" at this layer. Slots step `slot_duration_minutes` from the
/// opening time while strictly before the closing time.
pub fn generate_slots(date: NaiveDate, schedule: &ScheduleConfig) -> Vec<TimeSlot> {
    let hours = schedule.hours_for(date.weekday());
    if !hours.is_open {
        return Vec::new();
    }

    let (Some(open), Some(close)) = (parse_minutes(&hours.open), parse_minutes(&hours.close))
    else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = open;
    while current < close {
        let time = format!("{:02}:{:02}", current / 60, current % 60);
        slots.push(TimeSlot {
            display: format_time_display(&time),
            time,
        });
        current += schedule.slot_duration_minutes;
    }

    slots
}

/// "HH:MM" → minutes since midnight
fn parse_minutes(time: &str) -> Option<u32> {
    let (h, m) = time.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// 24 小时制 "HH:MM" → 12 小时制显示标签
///
/// 正午和午夜规范化为 12。
pub fn format_time_display(time24: &str) -> String {
    let Some(minutes) = parse_minutes(time24) else {
        return time24.to_string();
    };
    let hour = minutes / 60;
    let minute = minutes % 60;
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekday_schedule() -> ScheduleConfig {
        ScheduleConfig::default()
    }

    #[test]
    fn weekday_yields_twenty_slots() {
        // 2025-03-10 is a Monday: 08:00-18:00, 30-minute slots
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let slots = generate_slots(date, &weekday_schedule());

        assert_eq!(slots.len(), 20);
        assert_eq!(slots[0].time, "08:00");
        assert_eq!(slots[0].display, "8:00 AM");
        assert_eq!(slots[19].time, "17:30");
        assert_eq!(slots[19].display, "5:30 PM");
    }

    #[test]
    fn closed_day_yields_nothing() {
        // 2025-03-09 is a Sunday
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert!(generate_slots(date, &weekday_schedule()).is_empty());
    }

    #[test]
    fn saturday_uses_saturday_hours() {
        // 2025-03-08 is a Saturday: 09:00-16:00
        let date = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let slots = generate_slots(date, &weekday_schedule());
        assert_eq!(slots.first().map(|s| s.time.as_str()), Some("09:00"));
        assert_eq!(slots.last().map(|s| s.time.as_str()), Some("15:30"));
        assert_eq!(slots.len(), 14);
    }

    #[test]
    fn generation_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let a = generate_slots(date, &weekday_schedule());
        let b = generate_slots(date, &weekday_schedule());
        assert_eq!(a, b);
    }

    #[test]
    fn display_normalizes_noon_and_midnight() {
        assert_eq!(format_time_display("00:00"), "12:00 AM");
        assert_eq!(format_time_display("12:00"), "12:00 PM");
        assert_eq!(format_time_display("12:30"), "12:30 PM");
        assert_eq!(format_time_display("23:05"), "11:05 PM");
    }
}
