//! Chart-ready tables assembled from the calendar and the aggregation engine.
//!
//! Each composer is a small pure function returning typed rows with stable
//! field names; the field names double as the CSV/JSON column names.

use crate::aggregate::{
    aggregate, gross_profit_percent, mean_by, percent_of_indicator, round_to, safe_ratio,
    PeriodRatio,
};
use crate::calendar::PeriodCalendar;
use crate::error::{BenchError, Result};
use crate::models::{
    month_full, AggMode, BasketMetric, BasketRow, Dimension, Indicator, Metric, PeriodId,
    PeriodKey, Periodicity, StoreRecord, TransactionRow,
};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the general bar/line chart input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub period: PeriodId,
    pub year: i32,
    pub value: Option<f64>,
    pub warehouse_ratio: Option<f64>,
    /// Only filled for gross-profit views.
    pub gp_pct: Option<f64>,
    pub promotion_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    pub periodicity: Periodicity,
    pub metric: Metric,
    pub mode: AggMode,
    pub rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn ratio(&self, row: &SeriesRow, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Warehouse => row.warehouse_ratio,
            Indicator::Promotion => row.promotion_ratio,
        }
    }
}

fn ratio_map(ratios: Vec<PeriodRatio>) -> BTreeMap<PeriodKey, Option<f64>> {
    ratios
        .into_iter()
        .map(|r| {
            (
                PeriodKey {
                    period: r.period,
                    year: r.year,
                },
                r.ratio,
            )
        })
        .collect()
}

/// Period aggregate joined with warehouse %, promotion % and (for gross
/// profit) GP%.
///
/// For fiscal-quarter year-over-year views the first row is dropped: the first
/// observed quarter straddles the previous fiscal year and is never complete.
pub fn compose_series_input(
    rows: &[TransactionRow],
    metric: Metric,
    periodicity: Periodicity,
    mode: AggMode,
    calendar: &PeriodCalendar,
) -> SeriesTable {
    let base = aggregate(rows, metric, periodicity, calendar, mode);
    let warehouse = ratio_map(percent_of_indicator(
        rows,
        metric,
        periodicity,
        Indicator::Warehouse,
        mode,
    ));
    let promotion = ratio_map(percent_of_indicator(
        rows,
        metric,
        periodicity,
        Indicator::Promotion,
        mode,
    ));
    let gp = (metric == Metric::GrossProfit)
        .then(|| ratio_map(gross_profit_percent(rows, periodicity, calendar, mode)));

    let mut out: Vec<SeriesRow> = base
        .into_iter()
        .map(|pv| {
            let key = PeriodKey {
                period: pv.period,
                year: pv.year,
            };
            SeriesRow {
                period: pv.period,
                year: pv.year,
                value: pv.value,
                warehouse_ratio: warehouse.get(&key).copied().flatten(),
                gp_pct: gp.as_ref().and_then(|m| m.get(&key).copied().flatten()),
                promotion_ratio: promotion.get(&key).copied().flatten(),
            }
        })
        .collect();

    if periodicity == Periodicity::YoyQuarterly && !out.is_empty() {
        out.remove(0);
    }
    log::debug!(
        "series input: {} rows for {} / {}",
        out.len(),
        metric.label(),
        periodicity
    );
    SeriesTable {
        periodicity,
        metric,
        mode,
        rows: out,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketSeriesRow {
    pub period: PeriodId,
    pub year: i32,
    pub store_baskets: Option<f64>,
    pub avg_basket_size: Option<f64>,
    pub avg_basket_value: Option<f64>,
}

impl BasketSeriesRow {
    pub fn value(&self, metric: BasketMetric) -> Option<f64> {
        match metric {
            BasketMetric::Baskets => self.store_baskets,
            BasketMetric::AvgBasketSize => self.avg_basket_size,
            BasketMetric::AvgBasketValue => self.avg_basket_value,
        }
    }
}

/// Basket count, size and value, each averaged per period and joined.
///
/// All three are joined onto the same calendar first, so the inner join keeps
/// every calendar period.
pub fn compose_basket_input(
    rows: &[BasketRow],
    periodicity: Periodicity,
    calendar: &PeriodCalendar,
) -> Vec<BasketSeriesRow> {
    let per_metric: Vec<BTreeMap<PeriodKey, Option<f64>>> = BasketMetric::ALL
        .iter()
        .map(|m| {
            mean_by(rows, |r: &BasketRow| r.measure(*m), periodicity, calendar)
                .into_iter()
                .map(|pv| {
                    (
                        PeriodKey {
                            period: pv.period,
                            year: pv.year,
                        },
                        pv.value,
                    )
                })
                .collect()
        })
        .collect();

    let (baskets, size, value) = (&per_metric[0], &per_metric[1], &per_metric[2]);
    baskets
        .iter()
        .filter_map(|(key, b)| {
            let s = size.get(key)?;
            let v = value.get(key)?;
            Some(BasketSeriesRow {
                period: key.period,
                year: key.year,
                store_baskets: *b,
                avg_basket_size: *s,
                avg_basket_value: *v,
            })
        })
        .collect()
}

/// Per-dimension subtotals and share of the period total for sales, GP and units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynopticRow {
    pub dimension: String,
    pub period: PeriodId,
    pub year: i32,
    pub sales_ex_tax: f64,
    pub gross_profit_ex_tax: f64,
    pub sales_qty: f64,
    pub total_sales_ex_tax: f64,
    pub total_gross_profit_ex_tax: f64,
    pub total_sales_qty: f64,
    pub sales_ex_tax_pct_total: Option<f64>,
    pub gross_profit_ex_tax_pct_total: Option<f64>,
    pub sales_qty_pct_total: Option<f64>,
}

impl SynopticRow {
    pub fn share(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Sales => self.sales_ex_tax_pct_total,
            Metric::GrossProfit => self.gross_profit_ex_tax_pct_total,
            Metric::Units => self.sales_qty_pct_total,
        }
    }

    pub fn subtotal(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sales => self.sales_ex_tax,
            Metric::GrossProfit => self.gross_profit_ex_tax,
            Metric::Units => self.sales_qty,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Triple {
    sales: f64,
    gp: f64,
    units: f64,
}

impl Triple {
    fn add(&mut self, r: &TransactionRow) {
        self.sales += r.sales_ex_tax;
        self.gp += r.gross_profit_ex_tax;
        self.units += r.sales_qty;
    }
}

/// Composition of each period by `dimension`.
///
/// Errors with [`BenchError::MissingColumn`] when a row does not carry the
/// dimension (e.g. an extract without the classification column).
pub fn compose_synoptic_input(
    rows: &[TransactionRow],
    periodicity: Periodicity,
    dimension: Dimension,
) -> Result<Vec<SynopticRow>> {
    let mut by_dim: BTreeMap<(PeriodKey, String), Triple> = BTreeMap::new();
    for r in rows {
        let d = r
            .dimension(dimension)
            .ok_or_else(|| BenchError::missing_column("transactions", dimension.column()))?;
        by_dim
            .entry((r.stamp.key(periodicity), d.to_string()))
            .or_default()
            .add(r);
    }

    let mut totals: BTreeMap<PeriodKey, Triple> = BTreeMap::new();
    for ((key, _), t) in &by_dim {
        let e = totals.entry(*key).or_default();
        e.sales += t.sales;
        e.gp += t.gp;
        e.units += t.units;
    }

    Ok(by_dim
        .into_iter()
        .filter_map(|((key, dim), t)| {
            let total = totals.get(&key)?;
            Some(SynopticRow {
                dimension: dim,
                period: key.period,
                year: key.year,
                sales_ex_tax: t.sales,
                gross_profit_ex_tax: t.gp,
                sales_qty: t.units,
                total_sales_ex_tax: total.sales,
                total_gross_profit_ex_tax: total.gp,
                total_sales_qty: total.units,
                sales_ex_tax_pct_total: safe_ratio(Some(t.sales), Some(total.sales)),
                gross_profit_ex_tax_pct_total: safe_ratio(Some(t.gp), Some(total.gp)),
                sales_qty_pct_total: safe_ratio(Some(t.units), Some(total.units)),
            })
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreRole {
    Target,
    Benchmark,
}

/// Monthly metric per store normalized by floor area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRow {
    pub address_id: u64,
    pub store_name: String,
    pub store_size: f64,
    pub month: PeriodId,
    /// Display label such as `January-23`.
    pub label: String,
    pub value: f64,
    /// `None` unless both the value and the store size are positive.
    pub value_per_sqm: Option<f64>,
    pub role: StoreRole,
}

/// Per-store monthly totals and value per square metre.
///
/// The target's rows are added when the target is not already part of the
/// benchmark slice. Stores missing from `stores` are dropped.
pub fn compose_area_input(
    target_rows: &[TransactionRow],
    benchmark_rows: &[TransactionRow],
    stores: &[StoreRecord],
    target_id: u64,
    metric: Metric,
) -> Vec<AreaRow> {
    let in_benchmark: AHashSet<u64> = benchmark_rows.iter().map(|r| r.address_id).collect();
    let extra: &[TransactionRow] = if in_benchmark.contains(&target_id) {
        &[]
    } else {
        target_rows
    };

    let mut sums: BTreeMap<(u64, i32, u32), f64> = BTreeMap::new();
    for r in benchmark_rows.iter().chain(extra.iter()) {
        *sums
            .entry((r.address_id, r.stamp.year, r.stamp.month))
            .or_default() += r.measure(metric);
    }

    let by_id: AHashMap<u64, &StoreRecord> = stores.iter().map(|s| (s.address_id, s)).collect();
    sums.into_iter()
        .filter_map(|((id, year, month), value)| {
            let store = by_id.get(&id)?;
            let per_sqm = (value > 0.0 && store.store_size > 0.0)
                .then(|| round_to(value / store.store_size, 2));
            Some(AreaRow {
                address_id: id,
                store_name: store.store_name.clone(),
                store_size: store.store_size,
                month: PeriodId::MonthOfYear { year, month },
                label: format!("{}-{:02}", month_full(month), year.rem_euclid(100)),
                value,
                value_per_sqm: per_sqm,
                role: if id == target_id {
                    StoreRole::Target
                } else {
                    StoreRole::Benchmark
                },
            })
        })
        .collect()
}
