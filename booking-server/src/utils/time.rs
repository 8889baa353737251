//! 时间工具函数 — 业务时区转换
//!
//! 可用性和退款规则全部以业务本地时间计算。日期字符串只在这里
//! 解析一次，绝不经过会按 UTC 重解释的通用解析器。

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时段字符串 (HH:MM)
pub fn parse_slot_time(time: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time slot format: {}", time)))
}

/// 日期 → YYYY-MM-DD 字符串
pub fn date_to_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// UTC 时刻 → 业务时区本地时间
pub fn to_business_local(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

/// 业务本地时间 → Unix millis
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn local_to_millis(naive: NaiveDateTime, tz: Tz) -> i64 {
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 距指定日期零点的小时数 (可为负)
///
/// 取消资格与退款档位都以预约日零点为基准 (与历史数据口径一致)。
pub fn hours_until_day_start(date: NaiveDate, now_local: NaiveDateTime) -> f64 {
    let midnight = date.and_time(NaiveTime::MIN);
    (midnight - now_local).num_minutes() as f64 / 60.0
}

/// 星期名 (小写英文, 用于营业时间查表和日历概览)
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// 无符号整数 → base36 字符串 (预约号前缀)
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_day() {
        let d = parse_date("2025-03-10").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 3, 10));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("03/10/2025").is_err());
        assert!(parse_date("tomorrow").is_err());
        assert!(parse_date("2025-13-40").is_err());
    }

    #[test]
    fn hours_until_counts_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(hours_until_day_start(date, now), 48.0);

        let later = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(hours_until_day_start(date, later), 12.0);
    }

    #[test]
    fn base36_round_numbers() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
