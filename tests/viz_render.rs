use chrono::{Datelike, NaiveDate};
use std::fs;
use store_bench::calendar::build_calendar;
use store_bench::compose::{compose_area_input, compose_series_input};
use store_bench::index::index_series;
use store_bench::models::{Flag, PeriodStamp};
use store_bench::viz::{self, ChartOptions, LegendMode, RatioKind};
use store_bench::{AggMode, Metric, Periodicity, StoreRecord, TransactionRow};
use tempfile::tempdir;

fn tx(id: u64, date: &str, sales: f64) -> TransactionRow {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let month = d.month();
    let quarter = ((month + 5) % 12) / 3 + 1;
    let fiscal_year = if month >= 7 { d.year() + 1 } else { d.year() };
    TransactionRow {
        address_id: id,
        stamp: PeriodStamp::new(d, d.iso_week().week(), month, d.year(), quarter as u8, fiscal_year).unwrap(),
        finance_department: "GROCERY".into(),
        warehouse: if id % 2 == 0 { Flag::Y } else { Flag::N },
        promotion: Flag::N,
        sales_ex_tax: sales,
        gross_profit_ex_tax: sales * 0.3,
        sales_qty: sales / 4.0,
        classification: None,
    }
}

fn rows() -> Vec<TransactionRow> {
    let mut out = Vec::new();
    for (i, date) in ["2023-07-04", "2023-08-01", "2023-09-05", "2024-07-02", "2024-08-06"].iter().enumerate() {
        out.push(tx(1, date, 1000.0 + i as f64 * 50.0));
        out.push(tx(2, date, 1500.0 - i as f64 * 30.0));
        out.push(tx(3, date, 1200.0));
    }
    out
}

fn opts(legend: LegendMode) -> ChartOptions {
    ChartOptions {
        width: 900,
        height: 500,
        legend,
        ..Default::default()
    }
}

#[test]
fn series_and_ratio_charts_render_to_svg() {
    let all = rows();
    let target: Vec<_> = all.iter().filter(|r| r.address_id == 1).cloned().collect();
    let bench: Vec<_> = all.iter().filter(|r| r.address_id != 1).cloned().collect();
    let cal = build_calendar(&bench);
    let dir = tempdir().unwrap();

    for periodicity in [Periodicity::Monthly, Periodicity::YoyMonthly] {
        let t = compose_series_input(&target, Metric::Sales, periodicity, AggMode::AveragePerStore, &cal);
        let b = compose_series_input(&bench, Metric::Sales, periodicity, AggMode::AveragePerStore, &cal);
        let slices = [("Target", &t), ("Benchmark", &b)];

        let bars = dir.path().join(format!("bars_{periodicity:?}.svg"));
        viz::plot_series_table(&slices, &cal, &bars, &opts(LegendMode::Bottom)).unwrap();
        let svg = fs::read_to_string(&bars).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Benchmark"));

        let ratio = dir.path().join(format!("ratio_{periodicity:?}.svg"));
        viz::plot_ratio_table(&slices, &cal, RatioKind::Warehouse, &ratio, &opts(LegendMode::Right)).unwrap();
        assert!(fs::metadata(&ratio).unwrap().len() > 0);
    }
}

#[test]
fn indexed_and_area_charts_render() {
    let all = rows();
    let target: Vec<_> = all.iter().filter(|r| r.address_id == 1).cloned().collect();
    let bench: Vec<_> = all.iter().filter(|r| r.address_id != 1).cloned().collect();
    let dir = tempdir().unwrap();

    let t = index_series(&target, Metric::Sales, AggMode::AveragePerStore, true);
    let b = index_series(&bench, Metric::Sales, AggMode::AveragePerStore, true);
    let indexed = dir.path().join("indexed.svg");
    viz::plot_indexed(&[("Target", &t), ("Benchmark", &b)], &indexed, &opts(LegendMode::Inside)).unwrap();
    assert!(fs::read_to_string(&indexed).unwrap().contains("<svg"));

    let store = |id: u64| StoreRecord {
        address_id: id,
        store_name: format!("Store {id}"),
        state: "VIC".into(),
        channel_zone: "METRO-A".into(),
        store_size: 500.0 + id as f64 * 100.0,
        subsidy_program_1: "A".into(),
        subsidy_program_2: "X".into(),
        store_address: String::new(),
        store_owner: String::new(),
    };
    let stores: Vec<StoreRecord> = (1..=3).map(store).collect();
    let area = compose_area_input(&target, &bench, &stores, 1, Metric::Sales);
    let png = dir.path().join("area.png");
    viz::plot_area(&area, Metric::Sales, &png, &opts(LegendMode::Top)).unwrap();
    assert!(fs::metadata(&png).unwrap().len() > 0);
}

#[test]
fn empty_series_is_rejected() {
    let cal = build_calendar::<TransactionRow>(&[]);
    let t = compose_series_input(&[], Metric::Sales, Periodicity::Weekly, AggMode::SumOfStores, &cal);
    let dir = tempdir().unwrap();
    let err = viz::plot_series_table(&[("Target", &t)], &cal, dir.path().join("x.svg"), &ChartOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("no data"));
}
