//! 可用性解析
//!
//! 在时段生成器的输出上做减法：封锁时段、已占容量、当日最小提前量。
//! 只读，不持有任何可变状态；"现在" 由注入的时钟给出。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use shared::models::{DayOverview, TimeSlot};

use super::clock::Clock;
use super::slots::generate_slots;
use crate::core::config::ScheduleConfig;
use crate::db::models::Booking;
use crate::db::repository::{BlockedSlotRepository, BookingRepository};
use crate::utils::time::{date_to_string, parse_date, to_business_local, weekday_name};
use crate::utils::{AppError, AppResult};

/// Availability resolver over the booking ledger and blocked-slot registry
#[derive(Clone)]
pub struct SchedulingService {
    schedule: ScheduleConfig,
    tz: Tz,
    clock: Arc<dyn Clock>,
    bookings: BookingRepository,
    blocked: BlockedSlotRepository,
}

impl SchedulingService {
    pub fn new(
        schedule: ScheduleConfig,
        tz: Tz,
        clock: Arc<dyn Clock>,
        bookings: BookingRepository,
        blocked: BlockedSlotRepository,
    ) -> Self {
        Self {
            schedule,
            tz,
            clock,
            bookings,
            blocked,
        }
    }

    /// 当前业务本地时间
    pub fn now_local(&self) -> NaiveDateTime {
        to_business_local(self.clock.now_utc(), self.tz)
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// The day's full slot geometry, before any subtraction
    pub fn all_slots(&self, date: NaiveDate) -> Vec<TimeSlot> {
        generate_slots(date, &self.schedule)
    }

    /// GET 可用时段：生成 → 减封锁 → 减满容量 → 当日再减最小提前量
    ///
    /// 日期字符串逐段解析后重新格式化为规范键，绝不经过会引入时区
    /// 偏移的解析路径。
    pub async fn available_slots(&self, date: &str) -> AppResult<Vec<TimeSlot>> {
        let day = parse_date(date)?;
        self.available_slots_for_day(day).await
    }

    pub async fn available_slots_for_day(&self, day: NaiveDate) -> AppResult<Vec<TimeSlot>> {
        let now = self.now_local();
        let today = now.date();

        // 过去的日期没有可用时段
        if day < today {
            return Ok(Vec::new());
        }

        let date_key = date_to_string(day);

        let blocks = self
            .blocked
            .find_for_date(&date_key)
            .await
            .map_err(AppError::from)?;

        // 整日封锁支配一切
        if blocks.iter().any(|b| b.is_all_day) {
            return Ok(Vec::new());
        }

        let blocked_times: HashSet<String> =
            blocks.into_iter().filter_map(|b| b.time_slot).collect();

        let counts = self
            .bookings
            .count_active_by_slot(&date_key)
            .await
            .map_err(AppError::from)?;

        let min_cutoff = if day == today {
            Some(now + Duration::hours(self.schedule.min_notice_hours as i64))
        } else {
            None
        };

        Ok(filter_slots(
            self.all_slots(day),
            day,
            &blocked_times,
            &counts,
            self.schedule.max_bookings_per_slot,
            min_cutoff,
        ))
    }

    /// 派生检查：时段出现在可用列表中即可用
    ///
    /// 与同一调用方看到的列表原子一致 (同一次解析)。
    pub async fn is_slot_available(&self, date: &str, time_slot: &str) -> AppResult<bool> {
        let slots = self.available_slots(date).await?;
        Ok(slots.iter().any(|s| s.time == time_slot))
    }

    /// Per-day summary over an inclusive date range
    pub async fn calendar_overview(&self, start: &str, end: &str) -> AppResult<Vec<DayOverview>> {
        let start_day = parse_date(start)?;
        let end_day = parse_date(end)?;
        if end_day < start_day {
            return Err(AppError::validation("End date is before start date"));
        }

        let mut calendar = Vec::new();
        let mut current = start_day;
        while current <= end_day {
            let day_name = weekday_name(current);
            let hours = self.schedule.hours_for(current.weekday());

            let mut day = DayOverview {
                date: date_to_string(current),
                day_of_week: day_name.to_string(),
                is_open: hours.is_open,
                business_hours: if hours.is_open {
                    format!("{} - {}", hours.open, hours.close)
                } else {
                    "Closed".to_string()
                },
                available_slots: None,
                total_slots: None,
            };

            if day.is_open {
                day.available_slots = Some(self.available_slots_for_day(current).await?.len());
                day.total_slots = Some(self.all_slots(current).len());
            }

            calendar.push(day);
            let Some(next) = current.succ_opt() else {
                break;
            };
            current = next;
        }

        Ok(calendar)
    }

    /// Staff view: every booking for a day, ordered by slot
    pub async fn bookings_for_date(&self, date: &str) -> AppResult<Vec<Booking>> {
        let day = parse_date(date)?;
        let bookings = self
            .bookings
            .find_for_date(&date_to_string(day))
            .await
            .map_err(AppError::from)?;
        Ok(bookings)
    }
}

/// 过滤核心 (纯函数)
///
/// 保留顺序；一个时段被剔除当且仅当：被封锁、容量已满、或落在
/// 当日最小提前量窗口内 (不严格晚于 cutoff)。
fn filter_slots(
    slots: Vec<TimeSlot>,
    day: NaiveDate,
    blocked: &HashSet<String>,
    counts: &HashMap<String, u32>,
    max_per_slot: u32,
    min_cutoff: Option<NaiveDateTime>,
) -> Vec<TimeSlot> {
    slots
        .into_iter()
        .filter(|slot| {
            if blocked.contains(&slot.time) {
                return false;
            }
            if counts.get(&slot.time).copied().unwrap_or(0) >= max_per_slot {
                return false;
            }
            if let Some(cutoff) = min_cutoff {
                let Ok(time) = crate::utils::time::parse_slot_time(&slot.time) else {
                    return false;
                };
                if day.and_time(time) <= cutoff {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScheduleConfig;
    use crate::scheduling::slots::generate_slots;
    use chrono::NaiveDate;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn slots_for(date: NaiveDate) -> Vec<TimeSlot> {
        generate_slots(date, &ScheduleConfig::default())
    }

    #[test]
    fn blocked_slots_are_removed() {
        let blocked: HashSet<String> = ["10:00".to_string()].into();
        let out = filter_slots(slots_for(monday()), monday(), &blocked, &HashMap::new(), 2, None);
        assert!(!out.iter().any(|s| s.time == "10:00"));
        assert_eq!(out.len(), 19);
    }

    #[test]
    fn full_slots_are_removed_until_capacity_frees() {
        let mut counts = HashMap::new();
        counts.insert("10:00".to_string(), 2);

        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &counts,
            2,
            None,
        );
        assert!(!out.iter().any(|s| s.time == "10:00"));

        // one cancellation later the tally drops below capacity
        counts.insert("10:00".to_string(), 1);
        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &counts,
            2,
            None,
        );
        assert!(out.iter().any(|s| s.time == "10:00"));
    }

    #[test]
    fn min_notice_excludes_near_slots_today_only() {
        // now = 16:00, notice 2h → cutoff 18:00; 17:30 goes, nothing later
        // exists inside business hours that day
        let cutoff = monday().and_hms_opt(18, 0, 0).unwrap();
        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &HashMap::new(),
            2,
            Some(cutoff),
        );
        assert!(!out.iter().any(|s| s.time == "17:30"));
        assert!(out.is_empty());

        // other days are not filtered by "now"
        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &HashMap::new(),
            2,
            None,
        );
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn cutoff_comparison_is_strict() {
        // a slot exactly at the cutoff is excluded
        let cutoff = monday().and_hms_opt(10, 0, 0).unwrap();
        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &HashMap::new(),
            2,
            Some(cutoff),
        );
        assert!(!out.iter().any(|s| s.time == "10:00"));
        assert!(out.iter().any(|s| s.time == "10:30"));
    }

    #[test]
    fn late_evening_cutoff_does_not_wrap() {
        // now = 23:00 → cutoff 01:00 next day; every slot today is gone
        let cutoff = monday()
            .succ_opt()
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let out = filter_slots(
            slots_for(monday()),
            monday(),
            &HashSet::new(),
            &HashMap::new(),
            2,
            Some(cutoff),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let blocked: HashSet<String> = ["09:00".to_string(), "12:30".to_string()].into();
        let out = filter_slots(slots_for(monday()), monday(), &blocked, &HashMap::new(), 2, None);
        let times: Vec<_> = out.iter().map(|s| s.time.clone()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }
}
