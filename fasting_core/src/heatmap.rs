//! Yearly heatmap: one shaded cell per day, grouped by month.

use crate::calendar::{weekday_index, YearMonth};
use crate::{DayEntry, Plan, Protocol};
use chrono::NaiveDate;

/// Shade level for a protocol, 0 (shortest) ..= 5 (longest)
pub fn shade_for(protocol: Protocol) -> u8 {
    match protocol.hours() {
        0..=12 => 0,
        13..=16 => 1,
        17..=24 => 2,
        25..=36 => 3,
        37..=48 => 4,
        _ => 5,
    }
}

/// One day of the heatmap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatCell {
    /// No entry or explicitly not fasting
    Empty,
    Fast { shade: u8, completed: bool },
}

/// One month row of the heatmap
#[derive(Clone, Debug)]
pub struct HeatMonth {
    pub month: YearMonth,
    /// Blank cells before the 1st in a Monday-first week
    pub leading_blanks: u32,
    pub days: Vec<(NaiveDate, HeatCell)>,
}

pub fn cell_for(plan: &Plan, day: NaiveDate) -> HeatCell {
    match plan.get(day) {
        Some(DayEntry::Fasting(fast)) => HeatCell::Fast {
            shade: shade_for(fast.fasting_length()),
            completed: fast.is_completed(),
        },
        Some(DayEntry::NotFasting) | None => HeatCell::Empty,
    }
}

/// Build the twelve month rows for `year`
///
/// Returns an empty list for years outside the supported date range.
pub fn yearly_heatmap(plan: &Plan, year: i32) -> Vec<HeatMonth> {
    (1..=12)
        .filter_map(|m| YearMonth::new(year, m))
        .map(|month| HeatMonth {
            month,
            leading_blanks: weekday_index(month.first_day()),
            days: month
                .days()
                .into_iter()
                .map(|day| (day, cell_for(plan, day)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeelingRecord, StartTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_shades_cover_all_protocols() {
        let shades: Vec<u8> = Protocol::ALL.iter().map(|p| shade_for(*p)).collect();
        assert_eq!(shades, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_year_layout() {
        let months = yearly_heatmap(&Plan::new(), 2026);
        assert_eq!(months.len(), 12);
        assert_eq!(months.iter().map(|m| m.days.len()).sum::<usize>(), 365);
        // 1 January 2026 is a Thursday
        assert_eq!(months[0].leading_blanks, 3);
        assert_eq!(months[2].leading_blanks, 6);
        assert!(months
            .iter()
            .flat_map(|m| m.days.iter())
            .all(|(_, c)| *c == HeatCell::Empty));
    }

    #[test]
    fn test_cells_reflect_entries() {
        let mut plan = Plan::new();
        let evening: StartTime = "20:00".parse().unwrap();
        plan.set_day(date(2026, 5, 4), Protocol::H36, evening);
        plan.set_day(date(2026, 5, 5), Protocol::H16, evening);
        plan.attach_feeling(date(2026, 5, 5), FeelingRecord::new(1, "🎉").unwrap(), None);
        plan.clear_day(date(2026, 5, 6));

        assert_eq!(
            cell_for(&plan, date(2026, 5, 4)),
            HeatCell::Fast {
                shade: 3,
                completed: false
            }
        );
        assert_eq!(
            cell_for(&plan, date(2026, 5, 5)),
            HeatCell::Fast {
                shade: 1,
                completed: true
            }
        );
        assert_eq!(cell_for(&plan, date(2026, 5, 6)), HeatCell::Empty);
        assert_eq!(cell_for(&plan, date(2026, 5, 7)), HeatCell::Empty);
    }
}
