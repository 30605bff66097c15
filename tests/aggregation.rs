use chrono::{Datelike, NaiveDate};
use store_bench::aggregate::{self, gross_profit_percent, percent_of_indicator};
use store_bench::calendar::build_calendar;
use store_bench::models::{Flag, PeriodStamp};
use store_bench::{AggMode, Indicator, Metric, PeriodId, Periodicity, TransactionRow};

fn stamp(date: &str) -> PeriodStamp {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let month = d.month();
    let quarter = ((month + 5) % 12) / 3 + 1;
    let fiscal_year = if month >= 7 { d.year() + 1 } else { d.year() };
    PeriodStamp::new(d, d.iso_week().week(), month, d.year(), quarter as u8, fiscal_year).unwrap()
}

fn tx(id: u64, date: &str, warehouse: Flag, sales: f64) -> TransactionRow {
    TransactionRow {
        address_id: id,
        stamp: stamp(date),
        finance_department: "GROCERY".into(),
        warehouse,
        promotion: Flag::N,
        sales_ex_tax: sales,
        gross_profit_ex_tax: sales * 0.25,
        sales_qty: sales / 10.0,
        classification: None,
    }
}

fn sample() -> Vec<TransactionRow> {
    vec![
        tx(1, "2023-07-04", Flag::Y, 120.0),
        tx(1, "2023-07-04", Flag::N, 80.0),
        tx(2, "2023-07-04", Flag::Y, 40.0),
        tx(1, "2023-07-11", Flag::N, 90.0),
        tx(2, "2023-08-08", Flag::Y, 300.0),
        tx(3, "2023-10-03", Flag::N, 55.5),
        tx(3, "2024-01-09", Flag::Y, 10.0),
    ]
}

#[test]
fn calendar_covers_every_period_in_rows() {
    let rows = sample();
    let cal = build_calendar(&rows);
    for p in Periodicity::ALL {
        let keys = cal.keys(p);
        for r in &rows {
            assert!(keys.contains(&r.stamp.key(p)), "{p}: missing {:?}", r.stamp.key(p));
        }
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "{p}: keys not strictly ascending");
    }
}

#[test]
fn yoy_axis_drops_the_year() {
    let rows = vec![tx(1, "2023-07-04", Flag::N, 1.0), tx(1, "2024-07-02", Flag::N, 1.0)];
    let cal = build_calendar(&rows);
    assert_eq!(cal.axis(Periodicity::YoyMonthly), vec![PeriodId::Month(7)]);
    assert_eq!(cal.years(Periodicity::YoyMonthly), vec![2023, 2024]);
    assert_eq!(cal.axis(Periodicity::Monthly).len(), 2);
}

#[test]
fn aggregate_has_one_row_per_calendar_period() {
    let rows = sample();
    let cal = build_calendar(&rows);
    let only_store_3: Vec<TransactionRow> = rows.iter().filter(|r| r.address_id == 3).cloned().collect();
    for p in Periodicity::ALL {
        for mode in [AggMode::SumOfStores, AggMode::AveragePerStore] {
            let out = aggregate::aggregate(&only_store_3, Metric::Sales, p, &cal, mode);
            assert_eq!(out.len(), cal.keys(p).len(), "{p}");
        }
    }
    let weekly = aggregate::aggregate(&only_store_3, Metric::Sales, Periodicity::Weekly, &cal, AggMode::SumOfStores);
    let missing = weekly.iter().filter(|v| v.value.is_none()).count();
    assert_eq!(missing, cal.keys(Periodicity::Weekly).len() - 2);
}

#[test]
fn average_mode_divides_by_store_count() {
    let rows = vec![tx(1, "2023-07-04", Flag::N, 100.0), tx(2, "2023-07-04", Flag::N, 100.0)];
    let cal = build_calendar(&rows);
    let avg = aggregate::aggregate(&rows, Metric::Sales, Periodicity::Weekly, &cal, AggMode::AveragePerStore);
    let sum = aggregate::aggregate(&rows, Metric::Sales, Periodicity::Weekly, &cal, AggMode::SumOfStores);
    assert_eq!(avg[0].value, Some(100.0));
    assert_eq!(sum[0].value, Some(200.0));
}

#[test]
fn zero_total_gives_no_ratio() {
    let rows = vec![tx(1, "2023-07-04", Flag::Y, 0.0), tx(2, "2023-07-04", Flag::N, 0.0)];
    let out = percent_of_indicator(&rows, Metric::Sales, Periodicity::Weekly, Indicator::Warehouse, AggMode::SumOfStores);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].ratio, None);
}

#[test]
fn indicator_shares_stay_between_zero_and_one() {
    let rows = sample();
    for p in Periodicity::ALL {
        for mode in [AggMode::SumOfStores, AggMode::AveragePerStore] {
            for r in percent_of_indicator(&rows, Metric::Sales, p, Indicator::Warehouse, mode) {
                if let Some(v) = r.ratio {
                    assert!((0.0..=1.0).contains(&v), "{p}: {v}");
                }
            }
        }
    }
}

#[test]
fn warehouse_share_rounds_to_four_places() {
    let rows = vec![tx(1, "2023-07-04", Flag::Y, 1.0), tx(1, "2023-07-04", Flag::N, 2.0)];
    let out = percent_of_indicator(&rows, Metric::Sales, Periodicity::Weekly, Indicator::Warehouse, AggMode::SumOfStores);
    assert_eq!(out[0].ratio, Some(0.3333));
}

#[test]
fn gross_profit_percent_is_a_quarter() {
    let rows = sample();
    let cal = build_calendar(&rows);
    let out = gross_profit_percent(&rows, Periodicity::Monthly, &cal, AggMode::AveragePerStore);
    assert_eq!(out.len(), cal.keys(Periodicity::Monthly).len());
    for r in out {
        let v = r.ratio.unwrap();
        assert!((v - 0.25).abs() < 1e-3, "{v}");
    }
}
