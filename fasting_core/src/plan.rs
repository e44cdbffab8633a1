//! The plan store: the authoritative map from calendar day to entry.
//!
//! Every mutation replaces whole entries, so an operation either lands
//! completely or (for the guarded operations) leaves the plan untouched.

use crate::calendar::YearMonth;
use crate::{Completion, DayEntry, DayState, Fast, FastRef, FeelingRecord, Protocol, StartTime};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// A fasting plan keyed by local calendar day
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Plan {
    entries: BTreeMap<NaiveDate, DayEntry>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<NaiveDate, DayEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, day: NaiveDate) -> Option<&DayEntry> {
        self.entries.get(&day)
    }

    /// Distinguishes a never-set day from an explicitly cleared one
    pub fn day_state(&self, day: NaiveDate) -> DayState<'_> {
        match self.entries.get(&day) {
            None => DayState::NoEntry,
            Some(DayEntry::NotFasting) => DayState::NotFasting,
            Some(DayEntry::Fasting(fast)) => DayState::Fasting(fast),
        }
    }

    /// The fast filed under `day`, if any
    pub fn fast_on(&self, day: NaiveDate) -> Option<FastRef<'_>> {
        self.entries
            .get(&day)
            .and_then(DayEntry::as_fast)
            .map(|fast| FastRef { day, fast })
    }

    /// All entries in day order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayEntry)> {
        self.entries.iter().map(|(day, entry)| (*day, entry))
    }

    /// All fasting entries in day order
    pub fn fasts(&self) -> impl Iterator<Item = FastRef<'_>> {
        self.entries.iter().filter_map(|(day, entry)| {
            entry.as_fast().map(|fast| FastRef { day: *day, fast })
        })
    }

    /// Fasting entries filed under days of `month`
    pub fn fasts_in_month(&self, month: YearMonth) -> impl Iterator<Item = FastRef<'_>> {
        self.entries
            .range(month.first_day()..=month.last_day())
            .filter_map(|(day, entry)| entry.as_fast().map(|fast| FastRef { day: *day, fast }))
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Merge a bulk expansion; incoming entries replace existing ones by key
    pub fn apply_bulk(&mut self, partial: BTreeMap<NaiveDate, DayEntry>) {
        let count = partial.len();
        self.entries.extend(partial);
        tracing::debug!("Applied bulk plan covering {} days", count);
    }

    /// Plan (or re-plan) a single day
    ///
    /// Timing, length and goal are replaced; the completion state and its
    /// annotations carry over from an existing fast on the same day.
    pub fn set_day(&mut self, day: NaiveDate, protocol: Protocol, time: StartTime) {
        let carried = match self.entries.get(&day) {
            Some(DayEntry::Fasting(existing)) => existing.completion().clone(),
            _ => Completion::Pending,
        };
        let fast = Fast::new(protocol, time.on(day)).with_completion(carried);
        self.entries.insert(day, DayEntry::Fasting(fast));
        tracing::debug!("Set {} fast on {} at {}", protocol, day, time);
    }

    /// Explicitly mark a day as not fasting
    pub fn clear_day(&mut self, day: NaiveDate) {
        self.entries.insert(day, DayEntry::NotFasting);
        tracing::debug!("Cleared {}", day);
    }

    /// Un-complete a fast, dropping its feeling record and note
    ///
    /// Returns `false` (and changes nothing) unless the day holds a
    /// completed fast.
    pub fn toggle_uncomplete(&mut self, day: NaiveDate) -> bool {
        let Some(DayEntry::Fasting(fast)) = self.entries.get(&day) else {
            return false;
        };
        if !fast.is_completed() {
            return false;
        }
        let updated = fast.clone().with_completion(Completion::Pending);
        self.entries.insert(day, DayEntry::Fasting(updated));
        tracing::debug!("Marked {} as not completed", day);
        true
    }

    /// Complete a fast with a feeling record and optional note
    ///
    /// Returns `false` (and changes nothing) unless the day holds a fast.
    pub fn attach_feeling(
        &mut self,
        day: NaiveDate,
        feeling: FeelingRecord,
        note: Option<String>,
    ) -> bool {
        let Some(DayEntry::Fasting(fast)) = self.entries.get(&day) else {
            return false;
        };
        let note = note.filter(|n| !n.trim().is_empty());
        let updated = fast.clone().with_completion(Completion::Completed {
            feeling: Some(feeling),
            note,
        });
        self.entries.insert(day, DayEntry::Fasting(updated));
        tracing::debug!("Marked {} as completed", day);
        true
    }

    /// Drop every entry
    pub fn reset(&mut self) {
        self.entries.clear();
        tracing::debug!("Plan reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{expand, PlanSettings};
    use crate::Frequency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn evening() -> StartTime {
        "20:00".parse().unwrap()
    }

    fn feeling() -> FeelingRecord {
        FeelingRecord::new(2, "💪").unwrap()
    }

    #[test]
    fn test_day_state_variants() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        assert_eq!(plan.day_state(d), DayState::NoEntry);

        plan.clear_day(d);
        assert_eq!(plan.day_state(d), DayState::NotFasting);
        assert_eq!(plan.len(), 1);

        plan.set_day(d, Protocol::H16, evening());
        assert!(matches!(plan.day_state(d), DayState::Fasting(f) if f.fasting_length() == Protocol::H16));
    }

    #[test]
    fn test_apply_bulk_overwrites_only_covered_days() {
        let mut plan = Plan::new();
        let outside = date(2026, 2, 27);
        plan.set_day(outside, Protocol::H72, evening());
        plan.set_day(date(2026, 3, 20), Protocol::H36, evening());

        let settings = PlanSettings {
            frequency: Frequency::Weekly,
            ..PlanSettings::default()
        };
        plan.apply_bulk(expand(&settings, YearMonth::new(2026, 3).unwrap(), date(2026, 3, 1)));

        // Friday 20 March is not a Monday: the old fast is cleared
        assert_eq!(plan.get(date(2026, 3, 20)), Some(&DayEntry::NotFasting));
        assert!(plan.fast_on(date(2026, 3, 2)).is_some());
        assert_eq!(
            plan.fast_on(outside).map(|r| r.fast.fasting_length()),
            Some(Protocol::H72)
        );
    }

    #[test]
    fn test_apply_bulk_leaves_past_days_alone() {
        let mut plan = Plan::new();
        let past = date(2026, 3, 3);
        plan.set_day(past, Protocol::H24, evening());
        plan.attach_feeling(past, feeling(), None);

        plan.apply_bulk(expand(
            &PlanSettings::default(),
            YearMonth::new(2026, 3).unwrap(),
            date(2026, 3, 10),
        ));

        let kept = plan.fast_on(past).unwrap().fast;
        assert_eq!(kept.fasting_length(), Protocol::H24);
        assert!(kept.is_completed());
    }

    #[test]
    fn test_set_day_keeps_completion() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        plan.set_day(d, Protocol::H16, evening());
        plan.attach_feeling(d, feeling(), Some("fine".into()));

        plan.set_day(d, Protocol::H24, "18:00".parse().unwrap());
        let fast = plan.fast_on(d).unwrap().fast;
        assert_eq!(fast.fasting_length(), Protocol::H24);
        assert_eq!(fast.start_time(), d.and_hms_opt(18, 0, 0).unwrap());
        assert_eq!((fast.end_time() - fast.start_time()).num_hours(), 24);
        assert_eq!(fast.completion().note(), Some("fine"));
    }

    #[test]
    fn test_set_day_replaces_tombstone() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        plan.clear_day(d);
        plan.set_day(d, Protocol::H12, evening());
        assert!(!plan.fast_on(d).unwrap().fast.is_completed());
    }

    #[test]
    fn test_toggle_uncomplete_strips_annotations() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        plan.set_day(d, Protocol::H16, evening());
        assert!(plan.attach_feeling(d, feeling(), Some("note".into())));

        assert!(plan.toggle_uncomplete(d));
        let fast = plan.fast_on(d).unwrap().fast;
        assert_eq!(fast.completion(), &Completion::Pending);
        assert!(fast.completion().feeling().is_none());
        assert!(fast.completion().note().is_none());

        // Second toggle is a no-op
        assert!(!plan.toggle_uncomplete(d));
    }

    #[test]
    fn test_guarded_mutations_ignore_non_fasting_days() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        assert!(!plan.attach_feeling(d, feeling(), None));
        assert!(!plan.toggle_uncomplete(d));
        assert!(plan.is_empty());

        plan.clear_day(d);
        let before = plan.clone();
        assert!(!plan.attach_feeling(d, feeling(), None));
        assert_eq!(plan, before);
    }

    #[test]
    fn test_attach_feeling_drops_blank_note() {
        let mut plan = Plan::new();
        let d = date(2026, 3, 2);
        plan.set_day(d, Protocol::H16, evening());
        plan.attach_feeling(d, feeling(), Some("   ".into()));
        let fast = plan.fast_on(d).unwrap().fast;
        assert!(fast.is_completed());
        assert_eq!(fast.completion().feeling(), Some(&feeling()));
        assert!(fast.completion().note().is_none());
    }

    #[test]
    fn test_fasts_in_month_and_reset() {
        let mut plan = Plan::new();
        plan.set_day(date(2026, 2, 28), Protocol::H16, evening());
        plan.set_day(date(2026, 3, 1), Protocol::H16, evening());
        plan.set_day(date(2026, 3, 31), Protocol::H16, evening());
        plan.clear_day(date(2026, 3, 15));
        plan.set_day(date(2026, 4, 1), Protocol::H16, evening());

        let march: Vec<_> = plan
            .fasts_in_month(YearMonth::new(2026, 3).unwrap())
            .map(|r| r.day)
            .collect();
        assert_eq!(march, vec![date(2026, 3, 1), date(2026, 3, 31)]);
        assert_eq!(plan.fasts().count(), 4);

        plan.reset();
        assert!(plan.is_empty());
    }
}
