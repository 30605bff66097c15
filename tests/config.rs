use std::collections::BTreeSet;
use store_bench::config::{SessionConfig, load_config};
use store_bench::slice::CategoryPreset;
use store_bench::{AggMode, BenchmarkMode, Metric, Periodicity, ViewOption};
use tempfile::tempdir;

#[test]
fn empty_object_gives_defaults() {
    let cfg = SessionConfig::from_json("{}").unwrap();
    assert_eq!(cfg, SessionConfig::default());
    assert_eq!(cfg.mode, BenchmarkMode::Default);
    assert_eq!(cfg.periodicity, Periodicity::Weekly);
    assert_eq!(cfg.agg_mode, AggMode::AveragePerStore);
    assert_eq!(cfg.view, ViewOption::TargetVsBenchmark);
}

#[test]
fn partial_config_overrides_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(
        &path,
        r#"{
            "target": "1042",
            "mode": "custom",
            "filters": { "states": ["VIC", "NSW"], "deselected": [7] },
            "periodicity": "yoy-monthly",
            "metric": "gross-profit",
            "slice": { "category": "fresh" }
        }"#,
    )
    .unwrap();
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.target.as_deref(), Some("1042"));
    assert_eq!(cfg.mode, BenchmarkMode::Custom);
    assert_eq!(
        cfg.filters.states,
        Some(BTreeSet::from(["NSW".to_string(), "VIC".to_string()]))
    );
    assert!(cfg.filters.deselected.contains(&7));
    assert_eq!(cfg.periodicity, Periodicity::YoyMonthly);
    assert_eq!(cfg.metric, Metric::GrossProfit);
    assert_eq!(cfg.slice.category, CategoryPreset::Fresh);
    assert_eq!(cfg.agg_mode, AggMode::AveragePerStore);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(SessionConfig::from_json("{ not json").is_err());
}
