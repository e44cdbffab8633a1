//! Day-cell resolution: which fasts touch a given calendar day.
//!
//! A fast filed under day D can run into D+1, D+2 and (for 72 hours started
//! at midnight) D+3, so a day can show a fast starting on it, one still in
//! progress from an earlier day, and one ending on it.

use crate::calendar::{end_of_day, start_of_day};
use crate::filter::{matches_fast, Filters};
use crate::{FastRef, FeelingRecord, Plan};
use chrono::{Duration, NaiveDate};

/// How far back an earlier fast can still reach into a day
const LOOKBACK_DAYS: i64 = 3;

/// Which role a fast plays for a particular day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRole {
    Starting,
    Progressing,
    Ending,
}

/// The fasts touching one calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayCell<'a> {
    pub day: NaiveDate,
    pub starting: Option<FastRef<'a>>,
    pub progressing: Option<FastRef<'a>>,
    pub ending: Option<FastRef<'a>>,
}

/// Resolve the starting, in-progress and ending fasts for `day`
///
/// Earlier days are probed at the target day's midnight, nearest day first;
/// the first earlier fast whose window contains that instant wins.
pub fn resolve_day(plan: &Plan, day: NaiveDate) -> DayCell<'_> {
    let starting = plan.fast_on(day);
    let mut progressing = None;
    let mut ending = None;

    let probe = start_of_day(day);
    for back in 1..=LOOKBACK_DAYS {
        let source_day = day - Duration::days(back);
        let Some(source) = plan.fast_on(source_day) else {
            continue;
        };
        if !source.fast.contains(probe) {
            continue;
        }
        if source.fast.end_time().date() == day {
            ending = Some(source);
        } else if probe < source.fast.end_time() {
            progressing = Some(source);
        }
        break;
    }

    DayCell {
        day,
        starting,
        progressing,
        ending,
    }
}

impl<'a> DayCell<'a> {
    /// The fast representing this day: starting > progressing > ending
    pub fn primary(&self) -> Option<(CellRole, FastRef<'a>)> {
        self.starting
            .map(|r| (CellRole::Starting, r))
            .or_else(|| self.progressing.map(|r| (CellRole::Progressing, r)))
            .or_else(|| self.ending.map(|r| (CellRole::Ending, r)))
    }

    pub fn is_empty(&self) -> bool {
        self.primary().is_none()
    }

    /// Whether the primary fast's source entry is completed
    pub fn is_completed(&self) -> bool {
        self.primary().is_some_and(|(_, r)| r.fast.is_completed())
    }

    /// Feeling logged on the primary fast's source entry
    pub fn feeling(&self) -> Option<&'a FeelingRecord> {
        self.primary().and_then(|(_, r)| r.fast.completion().feeling())
    }

    /// Whether the cell is shown at full strength under `filters`
    ///
    /// Only the primary fast is considered; a cell with no fast is always
    /// visible.
    pub fn is_visible(&self, filters: &Filters) -> bool {
        match self.primary() {
            Some((_, r)) => matches_fast(r.fast, filters),
            None => true,
        }
    }

    /// Whether any part of this day falls inside the given fast's window
    pub fn overlaps_active(&self, fast: FastRef<'_>) -> bool {
        start_of_day(self.day) <= fast.fast.end_time()
            && end_of_day(self.day) >= fast.fast.start_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ProtocolFilter, StatusFilter};
    use crate::{FeelingRecord, Protocol, StartTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(s: &str) -> StartTime {
        s.parse().unwrap()
    }

    // 2 March 2026 is a Monday
    const MON: u32 = 2;

    #[test]
    fn test_72h_fast_spans_four_cells() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H72, time("20:00"));

        let mon = resolve_day(&plan, date(2026, 3, MON));
        assert!(mon.starting.is_some());
        assert!(mon.progressing.is_none() && mon.ending.is_none());

        for d in [MON + 1, MON + 2] {
            let cell = resolve_day(&plan, date(2026, 3, d));
            assert!(cell.starting.is_none());
            assert_eq!(cell.progressing.map(|r| r.day), Some(date(2026, 3, MON)));
            assert!(cell.ending.is_none());
        }

        // Ends Thursday 20:00
        let thu = resolve_day(&plan, date(2026, 3, MON + 3));
        assert!(thu.starting.is_none() && thu.progressing.is_none());
        assert_eq!(thu.ending.map(|r| r.day), Some(date(2026, 3, MON)));

        assert!(resolve_day(&plan, date(2026, 3, MON + 4)).is_empty());
    }

    #[test]
    fn test_48h_fast_ends_on_wednesday() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H48, time("20:00"));

        let tue = resolve_day(&plan, date(2026, 3, MON + 1));
        assert!(tue.progressing.is_some());
        assert!(tue.starting.is_none() && tue.ending.is_none());

        let wed = resolve_day(&plan, date(2026, 3, MON + 2));
        assert!(wed.ending.is_some());
        assert!(wed.starting.is_none() && wed.progressing.is_none());
    }

    #[test]
    fn test_overnight_fast_ends_next_day() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H16, time("20:00"));
        let tue = resolve_day(&plan, date(2026, 3, MON + 1));
        assert_eq!(tue.ending.map(|r| r.day), Some(date(2026, 3, MON)));
    }

    #[test]
    fn test_same_day_fast_does_not_reach_next_day() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H12, time("06:00"));
        assert!(resolve_day(&plan, date(2026, 3, MON + 1)).is_empty());
    }

    #[test]
    fn test_midnight_72h_reaches_third_day_back() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H72, time("00:00"));
        let thu = resolve_day(&plan, date(2026, 3, MON + 3));
        assert_eq!(thu.ending.map(|r| r.day), Some(date(2026, 3, MON)));
    }

    #[test]
    fn test_daily_plan_has_starting_and_ending() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H16, time("20:00"));
        plan.set_day(date(2026, 3, MON + 1), Protocol::H16, time("20:00"));

        let tue = resolve_day(&plan, date(2026, 3, MON + 1));
        assert_eq!(tue.starting.map(|r| r.day), Some(date(2026, 3, MON + 1)));
        assert_eq!(tue.ending.map(|r| r.day), Some(date(2026, 3, MON)));
        assert_eq!(tue.primary().map(|(role, _)| role), Some(CellRole::Starting));
    }

    #[test]
    fn test_nearest_earlier_fast_wins() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H72, time("00:00"));
        plan.set_day(date(2026, 3, MON + 1), Protocol::H24, time("12:00"));

        let wed = resolve_day(&plan, date(2026, 3, MON + 2));
        // Tuesday's fast ends Wednesday noon and is found first
        assert_eq!(wed.ending.map(|r| r.day), Some(date(2026, 3, MON + 1)));
        assert!(wed.progressing.is_none());
    }

    #[test]
    fn test_cleared_day_is_ignored() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H48, time("20:00"));
        plan.clear_day(date(2026, 3, MON));
        assert!(resolve_day(&plan, date(2026, 3, MON)).is_empty());
        assert!(resolve_day(&plan, date(2026, 3, MON + 1)).is_empty());
    }

    #[test]
    fn test_visibility_follows_primary_source() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H48, time("20:00"));
        plan.attach_feeling(date(2026, 3, MON), FeelingRecord::new(4, "🥱").unwrap(), None);

        let tue = resolve_day(&plan, date(2026, 3, MON + 1));
        assert!(tue.is_completed());
        assert_eq!(tue.feeling().map(|f| f.difficulty), Some(4));

        let completed_only = Filters {
            status: StatusFilter::Completed,
            ..Filters::default()
        };
        let only_16 = Filters {
            protocol: ProtocolFilter::Only(Protocol::H16),
            ..Filters::default()
        };
        assert!(tue.is_visible(&completed_only));
        assert!(!tue.is_visible(&only_16));
        assert!(resolve_day(&plan, date(2026, 3, 20)).is_visible(&only_16));
    }

    #[test]
    fn test_overlaps_active_fast() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, MON), Protocol::H16, time("20:00"));
        let fast = plan.fast_on(date(2026, 3, MON)).unwrap();

        assert!(resolve_day(&plan, date(2026, 3, MON)).overlaps_active(fast));
        assert!(resolve_day(&plan, date(2026, 3, MON + 1)).overlaps_active(fast));
        assert!(!resolve_day(&plan, date(2026, 3, MON + 2)).overlaps_active(fast));
        assert!(!resolve_day(&plan, date(2026, 3, MON - 1)).overlaps_active(fast));
    }
}
