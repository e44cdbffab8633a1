//! Temporal resolution: which fast is running now, or which one is next.
//!
//! Resolution is a pure function of the plan and an instant. Callers that
//! display a live tracker re-run it on every clock tick (1 Hz) and after
//! every plan mutation.

use crate::catalog::{stage_for, FastingStage};
use crate::{Fast, FastRef, Plan};
use chrono::{Duration, NaiveDateTime};

/// Result of classifying an instant against the plan
///
/// At most one of "active" and "next" can exist, so this is an enum rather
/// than a pair of options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemporalStatus<'a> {
    /// `now` lies inside this fast's window
    Active(FastRef<'a>),
    /// No fast is running; this is the first upcoming one
    Next(FastRef<'a>),
    /// Nothing running and nothing planned ahead
    Idle,
}

impl<'a> TemporalStatus<'a> {
    pub fn active(&self) -> Option<FastRef<'a>> {
        match self {
            TemporalStatus::Active(r) => Some(*r),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<FastRef<'a>> {
        match self {
            TemporalStatus::Next(r) => Some(*r),
            _ => None,
        }
    }
}

/// Classify `now` against every fast in the plan
///
/// Fasts are scanned in start-time order. The first one that contains `now`
/// becomes active; otherwise the first one starting after `now` becomes
/// next. Overlapping manual edits therefore resolve to the earliest start,
/// not the soonest end.
pub fn resolve(plan: &Plan, now: NaiveDateTime) -> TemporalStatus<'_> {
    let mut fasts: Vec<FastRef<'_>> = plan.fasts().collect();
    fasts.sort_by_key(|r| r.fast.start_time());

    for candidate in fasts {
        if candidate.fast.contains(now) {
            return TemporalStatus::Active(candidate);
        }
        if candidate.fast.start_time() > now {
            return TemporalStatus::Next(candidate);
        }
    }
    TemporalStatus::Idle
}

/// Live progress of a running fast
#[derive(Clone, Debug)]
pub struct FastProgress {
    pub elapsed: Duration,
    /// Time left, never negative
    pub remaining: Duration,
    /// 0.0 ..= 100.0
    pub percent: f64,
    pub stage: Option<&'static FastingStage>,
}

pub fn progress(fast: &Fast, now: NaiveDateTime) -> FastProgress {
    let total = fast.end_time() - fast.start_time();
    let elapsed = now - fast.start_time();
    let remaining = (fast.end_time() - now).max(Duration::zero());

    let percent = if total > Duration::zero() {
        (elapsed.num_milliseconds() as f64 / total.num_milliseconds() as f64 * 100.0)
            .clamp(0.0, 100.0)
    } else {
        100.0
    };

    let elapsed_hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;

    FastProgress {
        elapsed,
        remaining,
        percent,
        stage: stage_for(elapsed_hours),
    }
}

/// Time left until an upcoming fast starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

pub fn countdown(fast: &Fast, now: NaiveDateTime) -> Countdown {
    let secs = (fast.start_time() - now).num_seconds().max(0);
    Countdown {
        days: secs / 86_400,
        hours: (secs % 86_400) / 3_600,
        minutes: (secs % 3_600) / 60,
        seconds: secs % 60,
    }
}

/// Format a duration as `HH:MM:SS`, clamping negatives to zero
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3_600, (secs % 3_600) / 60, secs % 60)
}
