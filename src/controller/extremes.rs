use crate::round;
use chrono::NaiveDate;

/// Lowest and highest temperature seen on one calendar day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyExtremes {
    pub day: NaiveDate,
    pub low: f64,
    pub high: f64,
}

impl DailyExtremes {
    pub fn new(day: NaiveDate, t: f64) -> Self {
        let t = round(t, 1);
        Self { day, low: t, high: t }
    }

    /// Folds in a reading taken on `day`. A new day starts over from `t`.
    pub fn update(self, day: NaiveDate, t: f64) -> Self {
        if day != self.day {
            return Self::new(day, t);
        }
        let t = round(t, 1);
        Self {
            day,
            low: self.low.min(t),
            high: self.high.max(t),
        }
    }
}
