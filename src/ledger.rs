use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Points granted the first time the dashboard is opened on a given day.
pub const DAILY_BONUS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub date: NaiveDate,
    pub score: u32,
}

/// Per-day score history, one entry per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    days: BTreeMap<NaiveDate, u32>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from stored rows. The first row wins when a date repeats.
    pub fn from_entries(entries: impl IntoIterator<Item = ScoreEntry>) -> Self {
        let mut days = BTreeMap::new();
        for entry in entries {
            if days.contains_key(&entry.date) {
                warn!(date = %entry.date, "duplicate ledger date, keeping first entry");
                continue;
            }
            days.insert(entry.date, entry.score);
        }
        Self { days }
    }

    pub fn entries(&self) -> impl Iterator<Item = ScoreEntry> + '_ {
        self.days
            .iter()
            .map(|(date, score)| ScoreEntry { date: *date, score: *score })
    }

    pub fn score_on(&self, date: NaiveDate) -> Option<u32> {
        self.days.get(&date).copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total_score(&self) -> u64 {
        self.days.values().map(|score| u64::from(*score)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub ledger: Ledger,
    pub awarded_today: bool,
    pub backfilled: usize,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        self.awarded_today || self.backfilled > 0
    }
}

/// Fills skipped days with zero scores and awards today's bonus once.
///
/// A `today` earlier than the last recorded day leaves the ledger untouched.
pub fn reconcile(ledger: &Ledger, today: NaiveDate) -> Reconciliation {
    let mut days = ledger.days.clone();
    let mut backfilled = 0;

    if let Some(last_date) = ledger.last_date() {
        let gap = (today - last_date).num_days();
        if gap < 0 {
            warn!(%today, %last_date, "clock is behind the score ledger, skipping reconcile");
            return Reconciliation {
                ledger: ledger.clone(),
                awarded_today: false,
                backfilled: 0,
            };
        }
        for offset in 1..gap {
            days.insert(last_date + Duration::days(offset), 0);
            backfilled += 1;
        }
    }

    let awarded_today = !days.contains_key(&today);
    if awarded_today {
        days.insert(today, DAILY_BONUS);
    }

    Reconciliation {
        ledger: Ledger { days },
        awarded_today,
        backfilled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(date: NaiveDate, score: u32) -> ScoreEntry {
        ScoreEntry { date, score }
    }

    #[test]
    fn empty_ledger_gets_todays_bonus() {
        let today = day(2024, 1, 10);
        let result = reconcile(&Ledger::new(), today);

        assert!(result.awarded_today);
        assert_eq!(result.backfilled, 0);
        assert_eq!(result.ledger.entries().collect::<Vec<_>>(), vec![entry(today, 10)]);
    }

    #[test]
    fn gap_days_are_backfilled_with_zero() {
        let ledger = Ledger::from_entries([entry(day(2024, 1, 5), 10)]);
        let result = reconcile(&ledger, day(2024, 1, 8));

        assert!(result.awarded_today);
        assert_eq!(result.backfilled, 2);
        assert_eq!(
            result.ledger.entries().collect::<Vec<_>>(),
            vec![
                entry(day(2024, 1, 5), 10),
                entry(day(2024, 1, 6), 0),
                entry(day(2024, 1, 7), 0),
                entry(day(2024, 1, 8), 10),
            ]
        );
    }

    #[test]
    fn second_reconcile_on_same_day_is_a_no_op() {
        let ledger = Ledger::from_entries([entry(day(2024, 3, 1), 10)]);
        let today = day(2024, 3, 9);

        let first = reconcile(&ledger, today);
        let second = reconcile(&first.ledger, today);

        assert!(first.changed());
        assert!(!second.changed());
        assert!(!second.awarded_today);
        assert_eq!(second.ledger, first.ledger);
    }

    #[test]
    fn access_on_consecutive_day_does_not_backfill() {
        let ledger = Ledger::from_entries([entry(day(2024, 3, 1), 10)]);
        let result = reconcile(&ledger, day(2024, 3, 2));

        assert_eq!(result.backfilled, 0);
        assert_eq!(result.ledger.len(), 2);
    }

    #[test]
    fn backfill_covers_every_intermediate_day() {
        let last = day(2023, 12, 28);
        for gap in 2..20 {
            let today = last + Duration::days(gap);
            let ledger = Ledger::from_entries([entry(last, 10)]);
            let result = reconcile(&ledger, today);

            assert_eq!(result.backfilled as i64, gap - 1);
            assert_eq!(result.ledger.len() as i64, gap + 1);
            for offset in 1..gap {
                assert_eq!(result.ledger.score_on(last + Duration::days(offset)), Some(0));
            }
            assert_eq!(result.ledger.score_on(today), Some(DAILY_BONUS));
        }
    }

    #[test]
    fn clock_rollback_leaves_ledger_alone() {
        let ledger = Ledger::from_entries([entry(day(2024, 5, 10), 10)]);
        let result = reconcile(&ledger, day(2024, 5, 7));

        assert!(!result.changed());
        assert_eq!(result.ledger, ledger);
    }

    #[test]
    fn total_is_sum_of_daily_scores() {
        let ledger = Ledger::from_entries([
            entry(day(2024, 1, 1), 10),
            entry(day(2024, 1, 2), 0),
            entry(day(2024, 1, 3), 10),
        ]);
        assert_eq!(ledger.total_score(), 20);

        let result = reconcile(&ledger, day(2024, 1, 6));
        assert_eq!(result.ledger.total_score(), 30);
    }

    #[test]
    fn duplicate_dates_keep_first_entry() {
        let ledger = Ledger::from_entries([entry(day(2024, 1, 1), 10), entry(day(2024, 1, 1), 0)]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.score_on(day(2024, 1, 1)), Some(10));
    }
}
