//! Calendar arithmetic shared by every part of the planner.
//!
//! All weekday indexing goes through [`weekday_index`] (Monday = 0) so the
//! recurrence rules, the day-cell grid and the heatmap agree on where a week
//! starts.

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

/// Number of cells in the month grid (6 rows of 7 days)
pub const GRID_DAYS: usize = 42;

/// Two-letter weekday labels, Monday first
pub const WEEKDAY_LABELS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// A calendar month, identified by its first day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// The month a given day belongs to
    pub fn containing(day: NaiveDate) -> Self {
        Self {
            first: day - Duration::days(i64::from(day.day0())),
        }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    pub fn month(self) -> u32 {
        self.first.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first - Duration::days(1)
    }

    pub fn next(self) -> Self {
        // Day 32 of any month always lands in the following one
        Self::containing(self.first + Duration::days(32))
    }

    pub fn prev(self) -> Self {
        Self::containing(self.first - Duration::days(1))
    }

    pub fn contains(self, day: NaiveDate) -> bool {
        Self::containing(day) == self
    }

    /// Every day of the month in order
    pub fn days(self) -> Vec<NaiveDate> {
        self.first
            .iter_days()
            .take_while(|d| self.contains(*d))
            .collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parses `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Other(format!("Invalid month (expected YYYY-MM): {}", s));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = y.parse().map_err(|_| invalid())?;
        let month = m.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// All days of the given month
pub fn days_in_month(month: YearMonth) -> Vec<NaiveDate> {
    month.days()
}

/// The Monday-first 6x7 grid shown for a month, padded with days from the
/// neighbouring months
pub fn calendar_grid(month: YearMonth) -> Vec<NaiveDate> {
    let lead = i64::from(weekday_index(month.first_day()));
    let start = month.first_day() - Duration::days(lead);
    start.iter_days().take(GRID_DAYS).collect()
}

/// Monday = 0 ... Sunday = 6
pub fn weekday_index(day: NaiveDate) -> u32 {
    day.weekday().num_days_from_monday()
}

/// Canonical `YYYY-MM-DD` key for a local calendar day
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` day key
pub fn parse_day_key(key: &str) -> Result<NaiveDate> {
    let trimmed = key.trim();
    if trimmed.len() != 10 {
        return Err(Error::InvalidDayKey(key.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| Error::InvalidDayKey(key.to_string()))
}

/// Whether two instants fall on the same calendar day
pub fn is_same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}

/// 00:00:00 of the given day
pub fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::default())
}

/// 23:59:59.999 of the given day
pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month_lengths() {
        assert_eq!(days_in_month(YearMonth::new(2026, 1).unwrap()).len(), 31);
        assert_eq!(days_in_month(YearMonth::new(2026, 2).unwrap()).len(), 28);
        assert_eq!(days_in_month(YearMonth::new(2028, 2).unwrap()).len(), 29);
        assert_eq!(days_in_month(YearMonth::new(2026, 4).unwrap()).len(), 30);
    }

    #[test]
    fn test_month_navigation_across_year() {
        let dec = YearMonth::new(2026, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2027, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(dec.last_day(), date(2026, 12, 31));
        assert_eq!(YearMonth::containing(date(2026, 3, 17)).to_string(), "2026-03");
    }

    #[test]
    fn test_grid_starts_on_monday_and_has_six_rows() {
        // March 2026 starts on a Sunday
        let grid = calendar_grid(YearMonth::new(2026, 3).unwrap());
        assert_eq!(grid.len(), GRID_DAYS);
        assert_eq!(grid[0], date(2026, 2, 23));
        assert_eq!(grid[6], date(2026, 3, 1));
        assert_eq!(grid[41], date(2026, 4, 5));
        assert!(grid.iter().step_by(7).all(|d| weekday_index(*d) == 0));
    }

    #[test]
    fn test_grid_for_month_starting_monday_has_no_lead() {
        // June 2026 starts on a Monday
        let grid = calendar_grid(YearMonth::new(2026, 6).unwrap());
        assert_eq!(grid[0], date(2026, 6, 1));
    }

    #[test]
    fn test_weekday_index_is_monday_first() {
        assert_eq!(weekday_index(date(2026, 3, 2)), 0); // Monday
        assert_eq!(weekday_index(date(2026, 3, 8)), 6); // Sunday
    }

    #[test]
    fn test_day_key_roundtrip_and_padding() {
        let d = date(2026, 3, 5);
        assert_eq!(day_key(d), "2026-03-05");
        assert_eq!(parse_day_key("2026-03-05").unwrap(), d);
        assert!(parse_day_key("2026-3-5").is_err());
        assert!(parse_day_key("2026-02-30").is_err());
        assert!(parse_day_key("yesterday").is_err());
    }

    #[test]
    fn test_day_bounds() {
        let d = date(2026, 3, 5);
        assert_eq!(start_of_day(d).date(), d);
        assert_eq!(end_of_day(d).date(), d);
        assert!(is_same_day(start_of_day(d), end_of_day(d)));
        assert!(!is_same_day(end_of_day(d), start_of_day(d.succ_opt().unwrap())));
    }

    #[test]
    fn test_parse_year_month() {
        assert_eq!(
            "2026-11".parse::<YearMonth>().unwrap(),
            YearMonth::new(2026, 11).unwrap()
        );
        assert!("2026-13".parse::<YearMonth>().is_err());
        assert!("202611".parse::<YearMonth>().is_err());
    }
}
