use std::fs;
use store_bench::storage::{self, OutputFormat};
use store_bench::{BenchError, StoreRecord};
use tempfile::tempdir;

const STORES: &str = "\
address_id,store_name,state,channel_zone,store_size,subsidy_program_1,subsidy_program_2,store_address,store_owner,snapshot_week_end
2,Old Name,VIC,METRO-A,900,A,X,1 High St,Owner B,2023-01-03
1,North,VIC,METRO-A,800,A,X,2 Low St,Owner A,2023-06-27
2,New Name,VIC,METRO-B,950,B,Y,1 High St,Owner B,2023-06-27
";

const BASKETS: &str = "\
address_id,week_end,year_week,month,year,fiscal_quarter,fiscal_year,store_baskets,avg_basket_size,avg_basket_value
1,2023-07-04,27,7,2023,Q1 FY24,2024,1200,6.5,42.10
";

#[test]
fn stores_keep_latest_snapshot() {
    let stores = storage::read_stores(STORES.as_bytes()).unwrap();
    assert_eq!(stores.len(), 2);
    assert_eq!(stores[0].address_id, 1);
    assert_eq!(stores[1].store_name, "New Name");
    assert_eq!(stores[1].channel_zone, "METRO-B");
}

#[test]
fn missing_column_names_the_column() {
    let csv = "address_id,store_name\n1,North\n";
    match storage::read_stores(csv.as_bytes()) {
        Err(BenchError::MissingColumn { table, column }) => {
            assert_eq!(table, "stores");
            assert_eq!(column, "state");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn transactions_require_measures() {
    let csv = "address_id,week_end,year_week,month,year,fiscal_quarter,fiscal_year,finance_department,warehouse,promotion,sales_ex_tax,sales_qty\n";
    let err = storage::read_transactions(csv.as_bytes(), None).unwrap_err();
    assert!(matches!(err, BenchError::MissingColumn { ref column, .. } if column == "gross_profit_ex_tax"));
}

#[test]
fn bad_quarter_is_invalid_period() {
    let csv = BASKETS.replace("Q1 FY24", "Q9");
    let err = storage::read_baskets(csv.as_bytes(), None).unwrap_err();
    assert!(matches!(err, BenchError::InvalidPeriod { .. }));
}

#[test]
fn baskets_parse_fiscal_quarter_names() {
    let rows = storage::read_baskets(BASKETS.as_bytes(), None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stamp.fiscal_quarter, 1);
    assert_eq!(rows[0].avg_basket_value, 42.10);
}

#[test]
fn save_csv_and_json() {
    let stores: Vec<StoreRecord> = storage::read_stores(STORES.as_bytes()).unwrap();
    let dir = tempdir().unwrap();

    let csv_path = dir.path().join("stores.csv");
    storage::save_csv(&stores, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("address_id,store_name,state,"));
    assert_eq!(csv_txt.lines().count(), 1 + stores.len());

    let json_path = dir.path().join("stores.out");
    storage::save_rows(&stores, &json_path, Some(OutputFormat::Json)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(v.as_array().unwrap().len(), stores.len());
    assert_eq!(v[0]["store_name"], "North");
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = storage::load_stores(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, BenchError::Io(_)));
}
