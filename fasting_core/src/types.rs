//! Core domain types for the fasting planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Protocols (fixed fasting durations) and recurrence frequencies
//! - Start clock times and feeling records
//! - Fast entries and their completion state
//! - The explicit day-entry variants stored in a plan

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Protocol and Frequency
// ============================================================================

/// A fasting duration in whole hours
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Protocol {
    H12,
    H16,
    H24,
    H36,
    H48,
    H72,
}

impl Protocol {
    /// Every supported protocol, shortest first
    pub const ALL: [Protocol; 6] = [
        Protocol::H12,
        Protocol::H16,
        Protocol::H24,
        Protocol::H36,
        Protocol::H48,
        Protocol::H72,
    ];

    pub fn hours(self) -> u32 {
        match self {
            Protocol::H12 => 12,
            Protocol::H16 => 16,
            Protocol::H24 => 24,
            Protocol::H36 => 36,
            Protocol::H48 => 48,
            Protocol::H72 => 72,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::hours(i64::from(self.hours()))
    }

    pub fn from_hours(hours: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.hours() == hours)
            .ok_or(Error::InvalidProtocol(hours))
    }
}

impl TryFrom<u32> for Protocol {
    type Error = Error;

    fn try_from(hours: u32) -> Result<Self> {
        Self::from_hours(hours)
    }
}

impl From<Protocol> for u32 {
    fn from(protocol: Protocol) -> Self {
        protocol.hours()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    /// Accepts `16` or `16h`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix(|c| c == 'h' || c == 'H')
            .unwrap_or(trimmed);
        let hours: u32 = digits
            .parse()
            .map_err(|_| Error::Other(format!("Not a protocol: {}", s)))?;
        Self::from_hours(hours)
    }
}

/// Rule determining which calendar days receive a fast
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    /// Odd calendar dates (1st, 3rd, ...)
    EveryOtherDay,
    /// Mondays only
    Weekly,
    /// An explicit set of weekdays
    Custom,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::EveryOtherDay => "every_other_day",
            Frequency::Weekly => "weekly",
            Frequency::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(Frequency::Daily),
            "every_other_day" | "everyotherday" => Ok(Frequency::EveryOtherDay),
            "weekly" => Ok(Frequency::Weekly),
            "custom" => Ok(Frequency::Custom),
            _ => Err(Error::InvalidSettings(format!("Unknown frequency: {}", s))),
        }
    }
}

// ============================================================================
// Start clock time
// ============================================================================

/// Clock time (hour and minute, zero seconds) at which a fast begins
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StartTime(NaiveTime);

impl StartTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(StartTime)
            .ok_or_else(|| Error::InvalidTime(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// The instant this clock time falls on for a given day
    pub fn on(self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.0)
    }
}

impl Default for StartTime {
    fn default() -> Self {
        StartTime(NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default())
    }
}

impl fmt::Display for StartTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for StartTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::InvalidTime(s.to_string()))?;
        let hour = h.parse().map_err(|_| Error::InvalidTime(s.to_string()))?;
        let minute = m.parse().map_err(|_| Error::InvalidTime(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for StartTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StartTime> for String {
    fn from(time: StartTime) -> Self {
        time.to_string()
    }
}

// ============================================================================
// Completion and feeling records
// ============================================================================

/// Subjective outcome captured when a fast is marked complete
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeelingRecord {
    /// 1 (very easy) ..= 5 (very hard)
    pub difficulty: u8,
    /// Mood symbol, usually an emoji
    pub feeling: String,
}

impl FeelingRecord {
    pub fn new(difficulty: u8, feeling: impl Into<String>) -> Result<Self> {
        let feeling = feeling.into();
        if !(1..=5).contains(&difficulty) {
            return Err(Error::InvalidFeeling(format!(
                "difficulty must be 1..=5, got {}",
                difficulty
            )));
        }
        if feeling.trim().is_empty() {
            return Err(Error::InvalidFeeling("feeling must not be empty".into()));
        }
        Ok(Self {
            difficulty,
            feeling,
        })
    }
}

/// Completion state of a fast
///
/// Annotations only exist on the `Completed` variant, so un-completing a
/// fast necessarily drops them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Completion {
    #[default]
    Pending,
    Completed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feeling: Option<FeelingRecord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed { .. })
    }

    pub fn feeling(&self) -> Option<&FeelingRecord> {
        match self {
            Completion::Completed { feeling, .. } => feeling.as_ref(),
            Completion::Pending => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            Completion::Completed { note, .. } => note.as_deref(),
            Completion::Pending => None,
        }
    }
}

// ============================================================================
// Fast and day entries
// ============================================================================

/// A planned fasting window
///
/// `end_time` is derived from `start_time` and the protocol when the fast is
/// created and stored from then on. Deserialization rejects records where
/// the two disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FastRecord")]
pub struct Fast {
    fasting_length: Protocol,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    goal: String,
    completion: Completion,
}

/// Wire shape of a [`Fast`] before the timing invariant is checked
#[derive(Deserialize)]
struct FastRecord {
    fasting_length: Protocol,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    completion: Completion,
}

impl TryFrom<FastRecord> for Fast {
    type Error = Error;

    fn try_from(record: FastRecord) -> Result<Self> {
        let expected = record.start_time + record.fasting_length.duration();
        if record.end_time != expected {
            return Err(Error::Other(format!(
                "end time {} does not match {} + {}",
                record.end_time, record.start_time, record.fasting_length
            )));
        }
        Ok(Fast {
            goal: record
                .goal
                .unwrap_or_else(|| crate::catalog::goal_for(record.fasting_length).to_string()),
            fasting_length: record.fasting_length,
            start_time: record.start_time,
            end_time: record.end_time,
            completion: record.completion,
        })
    }
}

impl Fast {
    /// Plan a new, not yet completed fast starting at `start_time`
    pub fn new(fasting_length: Protocol, start_time: NaiveDateTime) -> Self {
        Self {
            fasting_length,
            start_time,
            end_time: start_time + fasting_length.duration(),
            goal: crate::catalog::goal_for(fasting_length).to_string(),
            completion: Completion::Pending,
        }
    }

    pub fn fasting_length(&self) -> Protocol {
        self.fasting_length
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    /// Whether `instant` lies inside the closed window `[start, end]`
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start_time <= instant && instant <= self.end_time
    }

    pub(crate) fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }
}

/// What a plan records for one day key
///
/// A key that is absent from the plan means the day was never considered;
/// `NotFasting` is an explicit "no fast" left by a bulk apply or a removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayEntry {
    NotFasting,
    Fasting(Fast),
}

impl DayEntry {
    pub fn as_fast(&self) -> Option<&Fast> {
        match self {
            DayEntry::Fasting(fast) => Some(fast),
            DayEntry::NotFasting => None,
        }
    }

    pub fn is_fasting(&self) -> bool {
        matches!(self, DayEntry::Fasting(_))
    }
}

/// Borrowed view of a single day in a plan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayState<'a> {
    /// The key was never set
    NoEntry,
    /// The key was explicitly cleared
    NotFasting,
    Fasting(&'a Fast),
}

/// A fast together with the day key it is filed under
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastRef<'a> {
    pub day: NaiveDate,
    pub fast: &'a Fast,
}
