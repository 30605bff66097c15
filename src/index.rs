//! Weekly series rebased to 100 at the first observed week.

use crate::models::{AggMode, Metric, TransactionRow};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedPoint {
    pub week_end: NaiveDate,
    /// `None` when the series has no usable base (first value zero or non-finite).
    pub indexed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedSeries {
    pub metric: Metric,
    pub cumulative: bool,
    pub points: Vec<IndexedPoint>,
}

impl IndexedSeries {
    /// Column header used when the series is written out.
    pub fn column_name(&self) -> String {
        if self.cumulative {
            format!("Cumulative {} Indexed", self.metric.label())
        } else {
            format!("{} Indexed", self.metric.label())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Rebase `values` so the first (optionally cumulative) value is 100.
///
/// Each output is `v / base * 100` rounded half to even. A zero or non-finite base has no
/// meaningful index, so every point comes back as `None`.
pub fn rebase(values: &[f64], cumulative: bool) -> Vec<Option<i64>> {
    let series: Vec<f64> = if cumulative {
        values
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v;
                Some(*acc)
            })
            .collect()
    } else {
        values.to_vec()
    };
    let Some(&base) = series.first() else {
        return Vec::new();
    };
    if base == 0.0 || !base.is_finite() {
        log::warn!("index base is {base}; indexed values left empty");
        return vec![None; series.len()];
    }
    series
        .iter()
        .map(|v| {
            let x = (v / base * 100.0).round_ties_even();
            x.is_finite().then_some(x as i64)
        })
        .collect()
}

/// Weekly values of `metric` for a slice.
///
/// Sum mode adds every row of the week. Average mode first totals each store's
/// rows for the week and then takes the mean across the stores present that week.
pub fn weekly_values(
    rows: &[TransactionRow],
    metric: Metric,
    mode: AggMode,
) -> BTreeMap<NaiveDate, f64> {
    let mut per_store: BTreeMap<NaiveDate, BTreeMap<u64, f64>> = BTreeMap::new();
    for r in rows {
        *per_store
            .entry(r.stamp.week_end)
            .or_default()
            .entry(r.address_id)
            .or_default() += r.measure(metric);
    }
    per_store
        .into_iter()
        .map(|(week, stores)| {
            let total: f64 = stores.values().sum();
            let v = match mode {
                AggMode::SumOfStores => total,
                AggMode::AveragePerStore => total / stores.len() as f64,
            };
            (week, v)
        })
        .collect()
}

/// Index a metric per week, plain or cumulative.
pub fn index_series(
    rows: &[TransactionRow],
    metric: Metric,
    mode: AggMode,
    cumulative: bool,
) -> IndexedSeries {
    let weekly = weekly_values(rows, metric, mode);
    let values: Vec<f64> = weekly.values().copied().collect();
    let indexed = rebase(&values, cumulative);
    let points = weekly
        .keys()
        .zip(indexed)
        .map(|(week_end, indexed)| IndexedPoint {
            week_end: *week_end,
            indexed,
        })
        .collect();
    IndexedSeries {
        metric,
        cumulative,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebase_anchors_at_100() {
        assert_eq!(
            rebase(&[50.0, 75.0, 25.0], false),
            vec![Some(100), Some(150), Some(50)]
        );
    }

    #[test]
    fn rebase_cumulative() {
        // cumsum = 10, 30, 60
        assert_eq!(
            rebase(&[10.0, 20.0, 30.0], true),
            vec![Some(100), Some(300), Some(600)]
        );
    }

    #[test]
    fn zero_base_yields_nulls() {
        assert_eq!(rebase(&[0.0, 5.0], false), vec![None, None]);
        assert_eq!(rebase(&[0.0, 5.0], true), vec![None, None]);
    }

    #[test]
    fn rebase_rounds_halves_to_even() {
        // 1/8 and 3/8 of the base land exactly on 12.5 and 37.5.
        assert_eq!(rebase(&[8.0, 1.0, 3.0], false), vec![Some(100), Some(12), Some(38)]);
    }

    #[test]
    fn empty_input() {
        assert!(rebase(&[], false).is_empty());
    }
}
