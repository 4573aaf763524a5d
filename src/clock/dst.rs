// UK daylight saving rules: BST runs from 01:00 UTC on the last Sunday of
// March until 01:00 UTC on the last Sunday of October.
use chrono::prelude::*;
use chrono::TimeDelta;

fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let last_day = if month == 12 {
        NaiveDate::from_ymd_opt(year, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?
    };
    let back = last_day.weekday().num_days_from_sunday() as i64;
    Some(last_day - TimeDelta::days(back))
}

/// DST window for a given year, as UTC instants [start, end)
pub fn window(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = last_sunday(year, 3)?.and_hms_opt(1, 0, 0)?.and_utc();
    let end = last_sunday(year, 10)?.and_hms_opt(1, 0, 0)?.and_utc();
    Some((start, end))
}

pub fn is_summer_time(utc: DateTime<Utc>) -> bool {
    match window(utc.year()) {
        Some((start, end)) => utc >= start && utc < end,
        None => false,
    }
}

/// Offset to add to UTC to get UK local time
pub fn offset(utc: DateTime<Utc>) -> TimeDelta {
    if is_summer_time(utc) {
        TimeDelta::hours(1)
    } else {
        TimeDelta::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn finds_last_sundays() {
        assert_eq!(last_sunday(2024, 3), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(last_sunday(2024, 10), NaiveDate::from_ymd_opt(2024, 10, 27));
        assert_eq!(last_sunday(2025, 3), NaiveDate::from_ymd_opt(2025, 3, 30));
        assert_eq!(last_sunday(2025, 10), NaiveDate::from_ymd_opt(2025, 10, 26));
        assert_eq!(last_sunday(2026, 12), NaiveDate::from_ymd_opt(2026, 12, 27));
    }

    #[test]
    fn switches_at_one_utc() {
        assert!(!is_summer_time(utc(2025, 3, 30, 0, 59)));
        assert!(is_summer_time(utc(2025, 3, 30, 1, 0)));
        assert!(is_summer_time(utc(2025, 10, 26, 0, 59)));
        assert!(!is_summer_time(utc(2025, 10, 26, 1, 0)));
    }

    #[test]
    fn winter_and_summer_offsets() {
        assert_eq!(offset(utc(2025, 1, 15, 12, 0)), TimeDelta::zero());
        assert_eq!(offset(utc(2025, 7, 15, 12, 0)), TimeDelta::hours(1));
    }
}
