use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Hour of the local day at which the next dish takes over.
pub const DAY_START_HOUR: u32 = 10;

/// Calendar date used as the store key, rendered `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Selector seed: the key's digits with separators stripped, `2024-01-15` -> `20240115`.
    pub fn seed(&self) -> u64 {
        u64::from(self.0.year().unsigned_abs()) * 10_000
            + u64::from(self.0.month()) * 100
            + u64::from(self.0.day())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(DateKey)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

/// The date key in force at `now`. Days start at `DAY_START_HOUR` local time,
/// so anything earlier still belongs to the previous calendar date.
pub fn effective_date<Tz: TimeZone>(now: &DateTime<Tz>) -> DateKey {
    let local = now.naive_local();
    let today = local.date();
    if local.hour() < DAY_START_HOUR {
        DateKey(today.pred_opt().unwrap_or(today))
    } else {
        DateKey(today)
    }
}

#[cfg(test)]
mod tests {
    use super::{effective_date, DateKey};
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    fn at(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateKey {
        let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        effective_date(&tz.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn boundary() {
        assert_eq!(at(7, 2024, 1, 15, 9, 59, 59).to_string(), "2024-01-14");
        assert_eq!(at(7, 2024, 1, 15, 10, 0, 0).to_string(), "2024-01-15");
        assert_eq!(at(0, 2024, 1, 15, 23, 59, 59).to_string(), "2024-01-15");
        assert_eq!(at(-5, 2024, 1, 15, 0, 0, 0).to_string(), "2024-01-14");
    }

    #[test]
    fn boundary_across_month_and_year() {
        assert_eq!(at(7, 2024, 3, 1, 8, 0, 0).to_string(), "2024-02-29");
        assert_eq!(at(7, 2025, 1, 1, 9, 0, 0).to_string(), "2024-12-31");
    }

    #[test]
    fn seed_strips_separators() {
        let key: DateKey = "2024-01-15".parse().unwrap();
        assert_eq!(key.seed(), 20240115);
        let key = DateKey::from(NaiveDate::from_ymd_opt(2026, 10, 8).unwrap());
        assert_eq!(key.seed(), 20261008);
        let key: DateKey = "0999-12-31".parse().unwrap();
        assert_eq!(key.seed(), 9991231);
    }

    #[test]
    fn parse_and_display() {
        let key: DateKey = "2024-02-29".parse().unwrap();
        assert_eq!(key.to_string(), "2024-02-29");
        assert!("2024-02-30".parse::<DateKey>().is_err());
        assert!("20240115".parse::<DateKey>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let key: DateKey = "2024-01-15".parse().unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-01-15\"");
    }
}
