//! View filters over fast entries and the filtered calendar/history datasets.

use crate::calendar::YearMonth;
use crate::{DayEntry, Error, Fast, FastRef, Plan, Protocol, Result};
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// Protocol selection of a filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProtocolFilter {
    #[default]
    All,
    Only(Protocol),
}

/// Completion selection of a filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Uncompleted,
}

/// A view selection; never persisted with the plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Filters {
    pub protocol: ProtocolFilter,
    pub status: StatusFilter,
}

impl Filters {
    pub fn is_default(&self) -> bool {
        *self == Filters::default()
    }
}

impl FromStr for ProtocolFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ProtocolFilter::All);
        }
        s.parse().map(ProtocolFilter::Only)
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "uncompleted" => Ok(StatusFilter::Uncompleted),
            _ => Err(Error::Other(format!("Unknown status filter: {}", s))),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Uncompleted => "uncompleted",
        };
        f.write_str(name)
    }
}

/// Whether a day entry passes the filters; non-fasting entries never do
pub fn matches(entry: &DayEntry, filters: &Filters) -> bool {
    entry
        .as_fast()
        .is_some_and(|fast| matches_fast(fast, filters))
}

/// Field-level comparison shared by entry filtering and day-cell dimming
pub fn matches_fast(fast: &Fast, filters: &Filters) -> bool {
    if let ProtocolFilter::Only(protocol) = filters.protocol {
        if fast.fasting_length() != protocol {
            return false;
        }
    }
    match filters.status {
        StatusFilter::All => true,
        StatusFilter::Completed => fast.is_completed(),
        StatusFilter::Uncompleted => !fast.is_completed(),
    }
}

/// Fasts filed under days of `month` that pass the filters, in day order
pub fn calendar_view<'a>(plan: &'a Plan, month: YearMonth, filters: &Filters) -> Vec<FastRef<'a>> {
    plan.fasts_in_month(month)
        .filter(|r| matches_fast(r.fast, filters))
        .collect()
}

/// Fasts that started before `now` and pass the filters, newest first
pub fn history_view<'a>(plan: &'a Plan, now: NaiveDateTime, filters: &Filters) -> Vec<FastRef<'a>> {
    let mut fasts: Vec<FastRef<'a>> = plan
        .fasts()
        .filter(|r| r.fast.start_time() < now)
        .filter(|r| matches_fast(r.fast, filters))
        .collect();
    fasts.sort_by(|a, b| b.fast.start_time().cmp(&a.fast.start_time()));
    fasts
}

/// Counts over a filtered dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PlanSummary {
    pub planned: usize,
    pub completed: usize,
    /// Whole percent, 0 when nothing is planned
    pub success_rate: u32,
}

pub fn summarize_view(fasts: &[FastRef<'_>]) -> PlanSummary {
    let planned = fasts.len();
    let completed = fasts.iter().filter(|r| r.fast.is_completed()).count();
    let success_rate = if planned > 0 {
        (completed as f64 / planned as f64 * 100.0).round() as u32
    } else {
        0
    };
    PlanSummary {
        planned,
        completed,
        success_rate,
    }
}
