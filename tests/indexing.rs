use chrono::{Datelike, Duration, NaiveDate};
use store_bench::index::{index_series, rebase};
use store_bench::models::{Flag, PeriodStamp};
use store_bench::{AggMode, Metric, TransactionRow};

fn week(id: u64, d: NaiveDate, sales: f64) -> TransactionRow {
    TransactionRow {
        address_id: id,
        stamp: PeriodStamp::new(d, d.iso_week().week(), d.month(), d.year(), 1, d.year()).unwrap(),
        finance_department: "GROCERY".into(),
        warehouse: Flag::N,
        promotion: Flag::N,
        sales_ex_tax: sales,
        gross_profit_ex_tax: 0.0,
        sales_qty: 1.0,
        classification: None,
    }
}

fn weekly(values: &[f64]) -> Vec<TransactionRow> {
    let start = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| week(1, start + Duration::weeks(i as i64), *v))
        .collect()
}

#[test]
fn first_point_is_one_hundred() {
    for values in [vec![50.0, 100.0, 25.0], vec![3.0], vec![0.5, 0.0, 7.25]] {
        let s = index_series(&weekly(&values), Metric::Sales, AggMode::SumOfStores, false);
        assert_eq!(s.points[0].indexed, Some(100));
        let c = index_series(&weekly(&values), Metric::Sales, AggMode::SumOfStores, true);
        assert_eq!(c.points[0].indexed, Some(100));
    }
}

#[test]
fn plain_index_scales_each_week() {
    let s = index_series(&weekly(&[50.0, 100.0, 25.0]), Metric::Sales, AggMode::SumOfStores, false);
    let v: Vec<Option<i64>> = s.points.iter().map(|p| p.indexed).collect();
    assert_eq!(v, vec![Some(100), Some(200), Some(50)]);
    assert_eq!(s.column_name(), "Sales ex Tax Indexed");
}

#[test]
fn cumulative_index_never_falls_for_non_negative_values() {
    let values = [12.0, 0.0, 3.5, 40.0, 0.0, 1.0, 9.9];
    let s = index_series(&weekly(&values), Metric::Sales, AggMode::SumOfStores, true);
    let v: Vec<i64> = s.points.iter().map(|p| p.indexed.unwrap()).collect();
    assert!(v.windows(2).all(|w| w[0] <= w[1]), "{v:?}");
    assert!(s.column_name().starts_with("Cumulative"));
}

#[test]
fn zero_base_leaves_the_series_empty() {
    assert_eq!(rebase(&[0.0, 10.0, 20.0], false), vec![None, None, None]);
    assert!(rebase(&[], true).is_empty());
}

#[test]
fn average_mode_uses_stores_present_that_week() {
    let d = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
    let rows = vec![
        week(1, d, 100.0),
        week(2, d, 300.0),
        week(1, d + Duration::weeks(1), 400.0),
    ];
    let s = index_series(&rows, Metric::Sales, AggMode::AveragePerStore, false);
    let v: Vec<Option<i64>> = s.points.iter().map(|p| p.indexed).collect();
    assert_eq!(v, vec![Some(100), Some(200)]);
}
