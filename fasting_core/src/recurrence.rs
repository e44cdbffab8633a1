//! Recurrence expansion: turn planner settings into per-day entries.
//!
//! Expansion covers one reference month and never touches days before
//! `today`. Days that do not match the frequency rule are emitted as
//! explicit `NotFasting` entries so that a new bulk apply clears fasts left
//! over from a previous one.

use crate::calendar::{weekday_index, YearMonth};
use crate::{DayEntry, Error, Fast, Frequency, Protocol, Result, StartTime};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings describing a recurring fasting protocol
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanSettings {
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,

    #[serde(default = "default_frequency")]
    pub frequency: Frequency,

    /// Weekdays used by the `custom` frequency
    #[serde(default = "default_days")]
    pub days: Vec<Weekday>,

    #[serde(default)]
    pub time: StartTime,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            frequency: default_frequency(),
            days: default_days(),
            time: StartTime::default(),
        }
    }
}

fn default_protocol() -> Protocol {
    Protocol::H16
}

fn default_frequency() -> Frequency {
    Frequency::Daily
}

fn default_days() -> Vec<Weekday> {
    vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
}

impl PlanSettings {
    /// Reject settings that cannot produce a plan
    pub fn validate(&self) -> Result<()> {
        if self.frequency == Frequency::Custom && self.days.is_empty() {
            return Err(Error::InvalidSettings(
                "custom frequency needs at least one weekday".into(),
            ));
        }
        Ok(())
    }
}

/// Whether a fast falls on `day` under the given rule
///
/// `every_other_day` is anchored to the date number (odd dates), not to a
/// rolling count, so the pattern restarts at every month boundary.
pub fn should_fast(frequency: Frequency, custom_days: &[Weekday], day: NaiveDate) -> bool {
    match frequency {
        Frequency::Daily => true,
        Frequency::EveryOtherDay => (day.day() - 1) % 2 == 0,
        Frequency::Weekly => weekday_index(day) == 0,
        Frequency::Custom => custom_days
            .iter()
            .any(|w| w.num_days_from_monday() == weekday_index(day)),
    }
}

/// Expand settings into entries for every day of `month` from `today` on
///
/// Past days are absent from the result entirely.
pub fn expand(
    settings: &PlanSettings,
    month: YearMonth,
    today: NaiveDate,
) -> BTreeMap<NaiveDate, DayEntry> {
    let entries: BTreeMap<NaiveDate, DayEntry> = month
        .days()
        .into_iter()
        .filter(|day| *day >= today)
        .map(|day| {
            let entry = if should_fast(settings.frequency, &settings.days, day) {
                DayEntry::Fasting(Fast::new(settings.protocol, settings.time.on(day)))
            } else {
                DayEntry::NotFasting
            };
            (day, entry)
        })
        .collect();

    tracing::debug!(
        "Expanded {} {} plan for {}: {} days ({} fasting)",
        settings.protocol,
        settings.frequency,
        month,
        entries.len(),
        entries.values().filter(|e| e.is_fasting()).count()
    );

    entries
}
