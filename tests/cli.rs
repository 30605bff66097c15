use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const STORES: &str = "\
address_id,store_name,state,channel_zone,store_size,subsidy_program_1,subsidy_program_2,store_address,store_owner,snapshot_week_end
1,Target Town,VIC,METRO-A,800,A,X,1 Main St,Owner A,2023-06-27
2,Peer One,VIC,METRO-A,1000,A,X,2 Main St,Owner B,2023-06-27
3,Peer Two,VIC,METRO-A,600,B,Y,3 Main St,Owner C,2023-06-27
4,Far Away,NSW,METRO-A,900,A,X,4 Main St,Owner D,2023-06-27
";

const TRANSACTIONS: &str = "\
address_id,week_end,year_week,month,year,fiscal_quarter,fiscal_year,finance_department,warehouse,promotion,sales_ex_tax,gross_profit_ex_tax,sales_qty
1,2023-07-04,27,7,2023,Q1,2024,GROCERY,Y,N,100,25,10
1,2023-08-01,31,8,2023,Q1,2024,DELI,N,Y,50,10,5
2,2023-07-04,27,7,2023,Q1,2024,GROCERY,Y,N,200,40,20
2,2023-08-01,31,8,2023,Q1,2024,GROCERY,N,N,220,44,22
3,2023-07-04,27,7,2023,Q1,2024,DELI,N,Y,80,20,8
4,2023-07-04,27,7,2023,Q1,2024,GROCERY,Y,N,999,99,99
";

const BASKETS: &str = "\
address_id,week_end,year_week,month,year,fiscal_quarter,fiscal_year,store_baskets,avg_basket_size,avg_basket_value
1,2023-07-04,27,7,2023,Q1,2024,400,3.0,25.0
2,2023-07-04,27,7,2023,Q1,2024,500,4.0,30.0
3,2023-07-04,27,7,2023,Q1,2024,300,2.0,20.0
2,2023-08-01,31,8,2023,Q1,2024,520,4.0,31.0
3,2023-08-01,31,8,2023,Q1,2024,280,2.0,19.0
";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("stores.csv"), STORES).unwrap();
    fs::write(dir.join("tx.csv"), TRANSACTIONS).unwrap();
    fs::write(dir.join("baskets.csv"), BASKETS).unwrap();
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("storebench"))
        .stdout(predicate::str::contains("benchmark"));
}

#[test]
fn benchmark_lists_default_peers() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path())
        .args(["--stores", "stores.csv", "benchmark", "--target", "Target Town"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 stores"))
        .stdout(predicate::str::contains("Peer Two"))
        .stdout(predicate::str::contains("Far Away").not());
}

#[test]
fn series_writes_one_file_per_slice() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path()).args([
        "--stores",
        "stores.csv",
        "series",
        "--transactions",
        "tx.csv",
        "--target",
        "1",
        "--periodicity",
        "monthly",
        "--out",
        "sales.csv",
        "--plot",
        "sales.svg",
    ]);
    cmd.assert().success();

    let bench = fs::read_to_string(dir.path().join("sales_benchmark.csv")).unwrap();
    assert!(bench.starts_with("period,year,value,"));
    // Jul: (200 + 80) / 2 stores, Aug: 220 / 2 stores.
    assert!(bench.contains("Jul-2023,2023,140.0"));
    assert!(bench.contains("Aug-2023,2023,110.0"));
    assert!(dir.path().join("sales_target.csv").exists());
    assert!(dir.path().join("sales.svg").exists());
}

#[test]
fn deselecting_every_peer_exits_with_message() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path()).args([
        "--stores",
        "stores.csv",
        "benchmark",
        "--target",
        "1",
        "--deselect",
        "2,3",
    ]);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Widen"));
}

#[test]
fn config_file_supplies_the_session() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join("session.json"),
        r#"{ "stores": "stores.csv", "transactions": "tx.csv", "target": "1", "view": "target" }"#,
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path()).args([
        "--config",
        "session.json",
        "index",
        "--out",
        "index.json",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("Sales ex Tax Indexed"));
    let v: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("index.json")).unwrap()).unwrap();
    assert_eq!(v[0]["indexed"], 100);
    assert_eq!(v[1]["indexed"], 50);
}

#[test]
fn baskets_writes_table_and_chart() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path()).args([
        "--stores",
        "stores.csv",
        "baskets",
        "--baskets",
        "baskets.csv",
        "--target",
        "1",
        "--periodicity",
        "monthly",
        "--out",
        "b.csv",
        "--plot",
        "x.svg",
    ]);
    cmd.assert().success();

    let bench = fs::read_to_string(dir.path().join("b_benchmark.csv")).unwrap();
    let header = bench.lines().next().unwrap();
    assert!(header.contains("store_baskets,avg_basket_size,avg_basket_value"));
    assert!(bench.contains("Jul-2023"));
    assert!(bench.contains("Aug-2023"));
    assert!(dir.path().join("b_target.csv").exists());
    assert!(dir.path().join("x.svg").exists());
}

#[test]
fn profile_writes_department_shares_and_chart() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let mut cmd = Command::cargo_bin("storebench").unwrap();
    cmd.current_dir(dir.path()).args([
        "--stores",
        "stores.csv",
        "profile",
        "--transactions",
        "tx.csv",
        "--target",
        "1",
        "--dimension",
        "department",
        "--view",
        "benchmark",
        "--out",
        "p.csv",
        "--plot",
        "p.svg",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("GROCERY"));

    let table = fs::read_to_string(dir.path().join("p.csv")).unwrap();
    let header = table.lines().next().unwrap();
    assert!(header.contains("sales_ex_tax_pct_total"));
    assert!(table.contains("DELI"));
    assert!(dir.path().join("p.svg").exists());
}
