//! Rolling-window statistics, streaks, badges and mood tallies.
//!
//! Everything here is derived on demand from the plan; nothing is stored.

use crate::Fast;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Largest gap between consecutive starts that keeps a streak going
const STREAK_GAP_DAYS: f64 = 1.5;

/// Streak length that unlocks [`Badge::IronWill`]
const IRON_WILL_STREAK: u32 = 5;

/// Fast length in hours that unlocks [`Badge::Marathoner`]
const MARATHON_HOURS: u32 = 36;

/// Window lengths in days offered by the stats view
pub const WINDOW_CHOICES: [u32; 2] = [7, 30];

/// Aggregate figures over completed fasts in a window
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StatsSnapshot {
    pub total_fasts: usize,
    /// Mean length in hours, rounded to one decimal
    pub average_duration: f64,
    /// Longest length in hours
    pub longest_fast: u32,
    pub longest_streak: u32,
}

/// Summarize completed fasts that started within the last `window_days`
pub fn summarize<'a, I>(fasts: I, window_days: u32, now: NaiveDateTime) -> StatsSnapshot
where
    I: IntoIterator<Item = &'a Fast>,
{
    // A window reaching past the calendar range has no lower bound
    let limit = now.checked_sub_signed(Duration::days(i64::from(window_days)));
    let mut relevant: Vec<&Fast> = fasts
        .into_iter()
        .filter(|f| f.is_completed() && limit.map_or(true, |l| f.start_time() >= l))
        .collect();

    if relevant.is_empty() {
        return StatsSnapshot::default();
    }

    let total_fasts = relevant.len();
    let total_hours: u32 = relevant.iter().map(|f| f.fasting_length().hours()).sum();
    let average = f64::from(total_hours) / total_fasts as f64;
    let longest_fast = relevant
        .iter()
        .map(|f| f.fasting_length().hours())
        .max()
        .unwrap_or(0);

    relevant.sort_by_key(|f| f.start_time());
    let longest_streak = longest_streak(relevant.iter().map(|f| f.start_time()));

    tracing::debug!(
        "Summarized {} completed fasts over {} days",
        total_fasts,
        window_days
    );

    StatsSnapshot {
        total_fasts,
        average_duration: (average * 10.0).round() / 10.0,
        longest_fast,
        longest_streak,
    }
}

/// Longest run of ascending start instants with gaps of at most 1.5 days
fn longest_streak(starts: impl Iterator<Item = NaiveDateTime>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDateTime> = None;

    for start in starts {
        current = match previous {
            Some(prev) => {
                let gap_days = (start - prev).num_milliseconds() as f64 / 86_400_000.0;
                if gap_days <= STREAK_GAP_DAYS {
                    current + 1
                } else {
                    1
                }
            }
            None => 1,
        };
        longest = longest.max(current);
        previous = Some(start);
    }
    longest
}

/// Achievements derived from a snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Badge {
    /// A streak of five or more fasts
    IronWill,
    /// A completed fast of 36 hours or more
    Marathoner,
}

impl Badge {
    pub fn icon(self) -> &'static str {
        match self {
            Badge::IronWill => "🔥",
            Badge::Marathoner => "🏃",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Badge::IronWill => "Iron Will",
            Badge::Marathoner => "Marathoner",
        }
    }

    pub fn description(self, stats: &StatsSnapshot) -> String {
        match self {
            Badge::IronWill => format!("Kept a streak of {} fasts in a row", stats.longest_streak),
            Badge::Marathoner => format!("Completed a fast of {}+ hours", MARATHON_HOURS),
        }
    }
}

pub fn badges(stats: &StatsSnapshot) -> Vec<Badge> {
    let mut earned = Vec::new();
    if stats.longest_streak >= IRON_WILL_STREAK {
        earned.push(Badge::IronWill);
    }
    if stats.longest_fast >= MARATHON_HOURS {
        earned.push(Badge::Marathoner);
    }
    earned
}

/// Count logged feelings on completed fasts, most frequent first
///
/// Ties are ordered by symbol so the output is stable.
pub fn feeling_tally<'a, I>(fasts: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Fast>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fast in fasts {
        if let Some(record) = fast.completion().feeling() {
            *counts.entry(record.feeling.as_str()).or_insert(0) += 1;
        }
    }
    let mut tally: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(feeling, count)| (feeling.to_string(), count))
        .collect();
    tally.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tally
}

/// Plain-text report suitable for sharing
pub fn share_report(stats: &StatsSnapshot, window_days: u32) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "My fasting report for the last {} days:", window_days);
    let _ = writeln!(report);
    let _ = writeln!(report, "Fasts completed: {}", stats.total_fasts);
    let _ = writeln!(report, "Average length: {} h", stats.average_duration);
    let _ = writeln!(report, "Longest fast: {} h", stats.longest_fast);
    let _ = writeln!(report, "Longest streak: {}", stats.longest_streak);

    let earned = badges(stats);
    if !earned.is_empty() {
        let _ = writeln!(report);
        let _ = writeln!(report, "Badges:");
        for badge in earned {
            let _ = writeln!(report, "- {} {}", badge.icon(), badge.name());
        }
    }
    report
}
