//! Shape composed tables into [`ChartData`]: categorical x labels plus aligned
//! series with gaps for missing values.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::calendar::PeriodCalendar;
use crate::compose::{AreaRow, BasketSeriesRow, SeriesRow, SeriesTable, StoreRole, SynopticRow};
use crate::index::IndexedSeries;
use crate::models::{BasketMetric, Metric, PeriodId, PeriodKey, Periodicity};

use super::types::{ChartData, ChartSeries, ValueFormat};

/// Which ratio column of a [`SeriesTable`] to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioKind {
    Warehouse,
    Promotion,
    GrossProfit,
}

impl RatioKind {
    pub fn label(self) -> &'static str {
        match self {
            RatioKind::Warehouse => "Warehouse",
            RatioKind::Promotion => "Promotions",
            RatioKind::GrossProfit => "GP",
        }
    }

    fn pick(self, row: &SeriesRow) -> Option<f64> {
        match self {
            RatioKind::Warehouse => row.warehouse_ratio,
            RatioKind::Promotion => row.promotion_ratio,
            RatioKind::GrossProfit => row.gp_pct,
        }
    }
}

impl std::str::FromStr for RatioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "warehouse" => Ok(RatioKind::Warehouse),
            "promotion" | "promotions" => Ok(RatioKind::Promotion),
            "gp" | "gp-pct" | "gross-profit" => Ok(RatioKind::GrossProfit),
            _ => Err(format!("unknown ratio: {s}")),
        }
    }
}

/// Label for a key whose period id does not carry its own year.
fn key_label(key: &PeriodKey) -> String {
    match key.period {
        PeriodId::FiscalQuarter(_) | PeriodId::Month(_) | PeriodId::YearWeek(_) => {
            format!("{} {}", key.period, key.year)
        }
        _ => key.period.to_string(),
    }
}

/// Lay out named slices of (key, value) points on the calendar axis.
///
/// Year-over-year periodicities produce one series per (slice, year) over the
/// year-free axis; the others one series per slice. Series with no values at
/// all are left out.
pub fn period_series(
    calendar: &PeriodCalendar,
    periodicity: Periodicity,
    slices: &[(&str, Vec<(PeriodKey, Option<f64>)>)],
) -> (Vec<String>, Vec<ChartSeries>) {
    let axis = calendar.axis(periodicity);
    let pos: BTreeMap<PeriodId, usize> = axis.iter().enumerate().map(|(i, p)| (*p, i)).collect();
    let x_labels: Vec<String> = axis.iter().map(|p| p.to_string()).collect();
    let single = slices.len() == 1;

    let mut out = Vec::new();
    for (name, points) in slices {
        if periodicity.is_yoy() {
            for year in calendar.years(periodicity) {
                let mut values = vec![None; axis.len()];
                for (key, v) in points.iter().filter(|(k, _)| k.year == year) {
                    if let Some(&i) = pos.get(&key.period) {
                        values[i] = *v;
                    }
                }
                let label = if single {
                    year.to_string()
                } else {
                    format!("{name} {year}")
                };
                out.push(ChartSeries { label, values });
            }
        } else {
            let mut values = vec![None; axis.len()];
            for (key, v) in points {
                if let Some(&i) = pos.get(&key.period) {
                    values[i] = *v;
                }
            }
            out.push(ChartSeries {
                label: name.to_string(),
                values,
            });
        }
    }
    out.retain(ChartSeries::has_values);
    (x_labels, out)
}

fn table_points<F>(table: &SeriesTable, pick: F) -> Vec<(PeriodKey, Option<f64>)>
where
    F: Fn(&SeriesRow) -> Option<f64>,
{
    table
        .rows
        .iter()
        .map(|r| {
            (
                PeriodKey {
                    period: r.period,
                    year: r.year,
                },
                pick(r),
            )
        })
        .collect()
}

fn metric_format(metric: Metric) -> ValueFormat {
    if metric.is_currency() {
        ValueFormat::Currency
    } else {
        ValueFormat::Count
    }
}

/// Bar-chart data for the metric column of one or more series tables.
pub fn series_chart(slices: &[(&str, &SeriesTable)], calendar: &PeriodCalendar) -> Option<ChartData> {
    let (_, first) = slices.first()?;
    let points: Vec<(&str, Vec<(PeriodKey, Option<f64>)>)> = slices
        .iter()
        .map(|(name, t)| (*name, table_points(t, |r| r.value)))
        .collect();
    let (x_labels, series) = period_series(calendar, first.periodicity, &points);
    Some(ChartData {
        title: format!(
            "{} - {} ({})",
            first.metric.label(),
            first.periodicity,
            first.mode.label()
        ),
        x_desc: first.periodicity.label().to_string(),
        y_desc: first.metric.label().to_string(),
        format: metric_format(first.metric),
        x_labels,
        series,
    })
}

/// Line-chart data for one ratio column.
pub fn ratio_chart(
    slices: &[(&str, &SeriesTable)],
    calendar: &PeriodCalendar,
    kind: RatioKind,
) -> Option<ChartData> {
    let (_, first) = slices.first()?;
    let points: Vec<(&str, Vec<(PeriodKey, Option<f64>)>)> = slices
        .iter()
        .map(|(name, t)| (*name, table_points(t, |r| kind.pick(r))))
        .collect();
    let (x_labels, series) = period_series(calendar, first.periodicity, &points);
    let title = match kind {
        RatioKind::GrossProfit => format!("GP % - {}", first.periodicity),
        _ => format!(
            "{} % of {} - {}",
            kind.label(),
            first.metric.label(),
            first.periodicity
        ),
    };
    Some(ChartData {
        title,
        x_desc: first.periodicity.label().to_string(),
        y_desc: format!("{} share", kind.label()),
        format: ValueFormat::Percent,
        x_labels,
        series,
    })
}

/// Bar-chart data for one basket statistic.
pub fn basket_chart(
    slices: &[(&str, &[BasketSeriesRow])],
    calendar: &PeriodCalendar,
    periodicity: Periodicity,
    metric: BasketMetric,
) -> ChartData {
    let points: Vec<(&str, Vec<(PeriodKey, Option<f64>)>)> = slices
        .iter()
        .map(|(name, rows)| {
            let pts = rows
                .iter()
                .map(|r| {
                    (
                        PeriodKey {
                            period: r.period,
                            year: r.year,
                        },
                        r.value(metric),
                    )
                })
                .collect();
            (*name, pts)
        })
        .collect();
    let (x_labels, series) = period_series(calendar, periodicity, &points);
    ChartData {
        title: format!("{} - {}", metric.label(), periodicity),
        x_desc: periodicity.label().to_string(),
        y_desc: metric.label().to_string(),
        format: match metric {
            BasketMetric::AvgBasketValue => ValueFormat::Currency,
            _ => ValueFormat::Count,
        },
        x_labels,
        series,
    }
}

/// Line-chart data for indexed series over the union of their weeks.
pub fn indexed_chart(series: &[(&str, &IndexedSeries)]) -> Option<ChartData> {
    let (_, first) = series.first()?;
    let weeks: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|(_, s)| s.points.iter().map(|p| p.week_end))
        .collect();
    let pos: BTreeMap<NaiveDate, usize> = weeks.iter().enumerate().map(|(i, w)| (*w, i)).collect();
    let out = series
        .iter()
        .map(|(name, s)| {
            let mut values = vec![None; weeks.len()];
            for p in &s.points {
                if let Some(&i) = pos.get(&p.week_end) {
                    values[i] = p.indexed.map(|v| v as f64);
                }
            }
            ChartSeries {
                label: name.to_string(),
                values,
            }
        })
        .filter(ChartSeries::has_values)
        .collect();
    Some(ChartData {
        title: first.column_name(),
        x_desc: "Week end".into(),
        y_desc: "Index".into(),
        format: ValueFormat::Index,
        x_labels: weeks.iter().map(|w| w.format("%Y-%m-%d").to_string()).collect(),
        series: out,
    })
}

/// Share-of-period-total lines, one per dimension value.
pub fn synoptic_chart(rows: &[SynopticRow], metric: Metric) -> ChartData {
    let keys: BTreeSet<PeriodKey> = rows
        .iter()
        .map(|r| PeriodKey {
            period: r.period,
            year: r.year,
        })
        .collect();
    let pos: BTreeMap<PeriodKey, usize> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut by_dim: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for r in rows {
        let key = PeriodKey {
            period: r.period,
            year: r.year,
        };
        let values = by_dim
            .entry(r.dimension.as_str())
            .or_insert_with(|| vec![None; keys.len()]);
        if let Some(&i) = pos.get(&key) {
            values[i] = r.share(metric);
        }
    }
    ChartData {
        title: format!("{} share by dimension", metric.label()),
        x_desc: "Period".into(),
        y_desc: "Share of total".into(),
        format: ValueFormat::Percent,
        x_labels: keys.iter().map(key_label).collect(),
        series: by_dim
            .into_iter()
            .map(|(label, values)| ChartSeries {
                label: label.to_string(),
                values,
            })
            .filter(ChartSeries::has_values)
            .collect(),
    }
}

/// Per-store value per square metre by month, target first.
pub fn area_chart(rows: &[AreaRow], metric: Metric) -> ChartData {
    let months: BTreeSet<PeriodId> = rows.iter().map(|r| r.month).collect();
    let pos: BTreeMap<PeriodId, usize> = months.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let mut labels: BTreeMap<PeriodId, String> = BTreeMap::new();
    // (role order, store name, id) keeps the target first and names stable.
    let mut stores: BTreeMap<(u8, String, u64), Vec<Option<f64>>> = BTreeMap::new();
    for r in rows {
        labels.entry(r.month).or_insert_with(|| r.label.clone());
        let role = match r.role {
            StoreRole::Target => 0,
            StoreRole::Benchmark => 1,
        };
        let values = stores
            .entry((role, r.store_name.clone(), r.address_id))
            .or_insert_with(|| vec![None; months.len()]);
        if let Some(&i) = pos.get(&r.month) {
            values[i] = r.value_per_sqm;
        }
    }
    ChartData {
        title: format!("{} per sqm", metric.label()),
        x_desc: "Month".into(),
        y_desc: format!("{} per sqm", metric.label()),
        format: metric_format(metric),
        x_labels: months
            .iter()
            .map(|m| labels.get(m).cloned().unwrap_or_else(|| m.to_string()))
            .collect(),
        series: stores
            .into_iter()
            .map(|((_, name, _), values)| ChartSeries {
                label: name,
                values,
            })
            .filter(ChartSeries::has_values)
            .collect(),
    }
}
