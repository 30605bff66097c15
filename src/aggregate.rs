//! Period aggregation: totals, percent-of-indicator ratios and GP%.
//!
//! Every function groups by the (period, year) key of the requested
//! [`Periodicity`]; the period and year columns come from the periodicity's
//! [`PeriodColumns`](crate::models::PeriodColumns) record. Functions that
//! feed a chart axis left-join onto the [`PeriodCalendar`] so missing periods
//! show up as `None` instead of disappearing.
//!
//! In [`AggMode::AveragePerStore`] the grouped sums are divided by the number
//! of distinct stores in the *input rows of the call*. That count is not
//! recomputed per period, so a period covered by fewer stores is still divided
//! by the full count.

use crate::calendar::PeriodCalendar;
use crate::models::{
    AggMode, Indicator, Metric, PeriodId, PeriodKey, Periodic, Periodicity, TransactionRow,
};
use ahash::AHashSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One aggregated point on a period axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub period: PeriodId,
    pub year: i32,
    pub value: Option<f64>,
}

/// One ratio point. `None` when the denominator is zero or absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRatio {
    pub period: PeriodId,
    pub year: i32,
    pub ratio: Option<f64>,
}

/// Round half away from zero to `places` decimals.
pub fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

/// `num / den`, or `None` for an absent/zero denominator or a non-finite result.
pub fn safe_ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(n), Some(d)) if d != 0.0 => {
            let r = n / d;
            r.is_finite().then_some(r)
        }
        _ => None,
    }
}

/// Number of distinct stores in `rows`.
pub fn store_count<'a, R, I>(rows: I) -> usize
where
    R: Periodic + 'a,
    I: IntoIterator<Item = &'a R>,
{
    rows.into_iter()
        .map(|r| r.address_id())
        .collect::<AHashSet<u64>>()
        .len()
}

fn grouped_sums<'a, R, I, F>(rows: I, periodicity: Periodicity, value: F) -> BTreeMap<PeriodKey, f64>
where
    R: Periodic + 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> f64,
{
    let mut sums: BTreeMap<PeriodKey, f64> = BTreeMap::new();
    for r in rows {
        *sums.entry(r.stamp().key(periodicity)).or_default() += value(r);
    }
    sums
}

/// Divide by the store count in average mode (rounded to cents); sums pass through.
fn apply_mode(mut sums: BTreeMap<PeriodKey, f64>, mode: AggMode, stores: usize) -> BTreeMap<PeriodKey, f64> {
    if mode == AggMode::AveragePerStore && stores > 0 {
        for v in sums.values_mut() {
            *v = round_to(*v / stores as f64, 2);
        }
    }
    sums
}

fn join_calendar(
    calendar: &PeriodCalendar,
    periodicity: Periodicity,
    values: &BTreeMap<PeriodKey, f64>,
) -> Vec<PeriodValue> {
    calendar
        .keys(periodicity)
        .iter()
        .map(|k| PeriodValue {
            period: k.period,
            year: k.year,
            value: values.get(k).copied(),
        })
        .collect()
}

/// Sum `value` per period, normalize per `mode`, round to 2 decimals and
/// left-join onto the calendar.
pub fn aggregate_by<R, F>(
    rows: &[R],
    value: F,
    periodicity: Periodicity,
    calendar: &PeriodCalendar,
    mode: AggMode,
) -> Vec<PeriodValue>
where
    R: Periodic,
    F: Fn(&R) -> f64,
{
    let stores = store_count(rows);
    let sums = apply_mode(grouped_sums(rows, periodicity, value), mode, stores);
    let rounded: BTreeMap<PeriodKey, f64> =
        sums.into_iter().map(|(k, v)| (k, round_to(v, 2))).collect();
    join_calendar(calendar, periodicity, &rounded)
}

/// Aggregate a sales metric per period.
pub fn aggregate(
    rows: &[TransactionRow],
    metric: Metric,
    periodicity: Periodicity,
    calendar: &PeriodCalendar,
    mode: AggMode,
) -> Vec<PeriodValue> {
    aggregate_by(rows, |r| r.measure(metric), periodicity, calendar, mode)
}

/// Row-level mean of `value` per period (rounded to 2 decimals), left-joined
/// onto the calendar. Used for basket statistics, which are already per-store.
pub fn mean_by<R, F>(
    rows: &[R],
    value: F,
    periodicity: Periodicity,
    calendar: &PeriodCalendar,
) -> Vec<PeriodValue>
where
    R: Periodic,
    F: Fn(&R) -> f64,
{
    let mut acc: BTreeMap<PeriodKey, (f64, usize)> = BTreeMap::new();
    for r in rows {
        let e = acc.entry(r.stamp().key(periodicity)).or_insert((0.0, 0));
        e.0 += value(r);
        e.1 += 1;
    }
    let means: BTreeMap<PeriodKey, f64> = acc
        .into_iter()
        .map(|(k, (sum, n))| (k, round_to(sum / n as f64, 2)))
        .collect();
    join_calendar(calendar, periodicity, &means)
}

/// Share of `metric` carried by rows where `indicator == Y`.
///
/// Total and indicator subtotal are aggregated independently with the same
/// store count, then outer-joined on (period, year). The ratio is rounded to 4
/// decimals and is `None` when the total is zero or either side is absent.
pub fn percent_of_indicator(
    rows: &[TransactionRow],
    metric: Metric,
    periodicity: Periodicity,
    indicator: Indicator,
    mode: AggMode,
) -> Vec<PeriodRatio> {
    let stores = store_count(rows);
    let total = apply_mode(
        grouped_sums(rows, periodicity, |r: &TransactionRow| r.measure(metric)),
        mode,
        stores,
    );
    let subtotal = apply_mode(
        grouped_sums(
            rows.iter().filter(|r| r.flag(indicator).is_yes()),
            periodicity,
            |r: &TransactionRow| r.measure(metric),
        ),
        mode,
        stores,
    );

    let keys: BTreeSet<PeriodKey> = total.keys().chain(subtotal.keys()).copied().collect();
    keys.into_iter()
        .map(|k| PeriodRatio {
            period: k.period,
            year: k.year,
            ratio: safe_ratio(subtotal.get(&k).copied(), total.get(&k).copied())
                .map(|r| round_to(r, 4)),
        })
        .collect()
}

/// Gross profit as a share of sales per period, left-joined onto the calendar.
///
/// In average mode numerator and denominator are both divided by the same
/// store count, so the mode only matters through rounding.
pub fn gross_profit_percent(
    rows: &[TransactionRow],
    periodicity: Periodicity,
    calendar: &PeriodCalendar,
    mode: AggMode,
) -> Vec<PeriodRatio> {
    let stores = store_count(rows);
    let gp = apply_mode(
        grouped_sums(rows, periodicity, |r: &TransactionRow| r.gross_profit_ex_tax),
        mode,
        stores,
    );
    let sales = apply_mode(
        grouped_sums(rows, periodicity, |r: &TransactionRow| r.sales_ex_tax),
        mode,
        stores,
    );
    calendar
        .keys(periodicity)
        .iter()
        .map(|k| PeriodRatio {
            period: k.period,
            year: k.year,
            ratio: safe_ratio(gp.get(k).copied(), sales.get(k).copied()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_ratio_handles_degenerate_denominators() {
        assert_eq!(safe_ratio(Some(1.0), Some(0.0)), None);
        assert_eq!(safe_ratio(Some(0.0), Some(0.0)), None);
        assert_eq!(safe_ratio(None, Some(2.0)), None);
        assert_eq!(safe_ratio(Some(1.0), None), None);
        assert_eq!(safe_ratio(Some(1.0), Some(4.0)), Some(0.25));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }
}
