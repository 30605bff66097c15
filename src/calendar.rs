//! Canonical period axes for the benchmark population.
//!
//! The calendar is always built from the *benchmark* rows, never from the
//! slice being charted, so every chart for a periodicity shares the same time
//! axis and a store without rows for a week still gets an (empty) point there.

use crate::models::{PeriodId, PeriodKey, Periodic, Periodicity};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodCalendar {
    periods: BTreeMap<Periodicity, Vec<PeriodKey>>,
}

impl PeriodCalendar {
    /// Collect the distinct (period, year) pairs for all six periodicities.
    pub fn build<R: Periodic>(rows: &[R]) -> Self {
        let mut sets: BTreeMap<Periodicity, BTreeSet<PeriodKey>> = Periodicity::ALL
            .iter()
            .map(|p| (*p, BTreeSet::new()))
            .collect();
        for row in rows {
            let stamp = row.stamp();
            for (p, set) in sets.iter_mut() {
                set.insert(stamp.key(*p));
            }
        }
        let periods = sets
            .into_iter()
            .map(|(p, set)| (p, set.into_iter().collect()))
            .collect();
        log::debug!("calendar built from {} rows", rows.len());
        Self { periods }
    }

    /// Join keys for a periodicity, ascending by (year, period).
    pub fn keys(&self, periodicity: Periodicity) -> &[PeriodKey] {
        self.periods
            .get(&periodicity)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// X-axis positions. Year-over-year views drop the year and sort by period alone;
    /// plain views keep the (year, period) order of [`keys`](Self::keys).
    pub fn axis(&self, periodicity: Periodicity) -> Vec<PeriodId> {
        let keys = self.keys(periodicity);
        if periodicity.is_yoy() {
            let set: BTreeSet<PeriodId> = keys.iter().map(|k| k.period).collect();
            set.into_iter().collect()
        } else {
            keys.iter().map(|k| k.period).collect()
        }
    }

    /// Distinct years present for a periodicity (the series dimension of YoY views).
    pub fn years(&self, periodicity: Periodicity) -> Vec<i32> {
        let set: BTreeSet<i32> = self.keys(periodicity).iter().map(|k| k.year).collect();
        set.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.values().all(|v| v.is_empty())
    }
}

/// Build the calendar for a benchmark population.
pub fn build_calendar<R: Periodic>(benchmark_rows: &[R]) -> PeriodCalendar {
    PeriodCalendar::build(benchmark_rows)
}
