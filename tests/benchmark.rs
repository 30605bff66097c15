use std::collections::BTreeSet;
use store_bench::benchmark::{cascade, filter_options, find_store, resolve_benchmark};
use store_bench::{BenchError, BenchmarkMode, FilterSelection, StoreRecord};

fn store(id: u64, state: &str, zone: &str, sp1: &str, sp2: &str) -> StoreRecord {
    StoreRecord {
        address_id: id,
        store_name: format!("Store {id}"),
        state: state.into(),
        channel_zone: zone.into(),
        store_size: 800.0,
        subsidy_program_1: sp1.into(),
        subsidy_program_2: sp2.into(),
        store_address: String::new(),
        store_owner: String::new(),
    }
}

fn set(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|s| s.to_string()).collect())
}

/// Target 1 in VIC/METRO-A, five VIC/METRO-A peers, three NSW stores.
fn population() -> Vec<StoreRecord> {
    let mut out = vec![store(1, "VIC", "METRO-A", "A", "X")];
    for (id, sp1, sp2) in [(2, "A", "X"), (3, "A", "Y"), (4, "B", "X"), (5, "B", "Y"), (6, "C", "X")] {
        out.push(store(id, "VIC", "METRO-A", sp1, sp2));
    }
    for id in 7..=9 {
        out.push(store(id, "NSW", "METRO-A", "A", "X"));
    }
    out.push(store(10, "VIC", "REGIONAL", "A", "X"));
    out
}

#[test]
fn default_group_is_same_state_and_zone_without_target() {
    let pop = population();
    let target = find_store(&pop, "1").unwrap();
    let group = resolve_benchmark(&pop, target, BenchmarkMode::Default, &FilterSelection::default()).unwrap();
    assert_eq!(group.members, BTreeSet::from([2, 3, 4, 5, 6]));
    assert!(!group.contains(1));
    assert!(group.working_ids().contains(&1));
    assert_eq!(group.criteria.states, BTreeSet::from(["VIC".to_string()]));
}

#[test]
fn default_mode_ignores_state_selection() {
    let pop = population();
    let target = find_store(&pop, "Store 1").unwrap();
    let sel = FilterSelection {
        states: set(&["NSW"]),
        ..Default::default()
    };
    let group = resolve_benchmark(&pop, target, BenchmarkMode::Default, &sel).unwrap();
    assert_eq!(group.len(), 5);
}

#[test]
fn custom_group_is_the_intersection_of_selections() {
    let pop = population();
    let target = &pop[0];
    let sel = FilterSelection {
        states: set(&["VIC"]),
        channel_zones: set(&["METRO-A"]),
        subsidy_program_1: set(&["A", "B"]),
        subsidy_program_2: set(&["X"]),
        ..Default::default()
    };
    let group = resolve_benchmark(&pop, target, BenchmarkMode::Custom, &sel).unwrap();
    let expected: BTreeSet<u64> = pop
        .iter()
        .filter(|s| s.state == "VIC" && s.channel_zone == "METRO-A")
        .filter(|s| ["A", "B"].contains(&s.subsidy_program_1.as_str()))
        .filter(|s| s.subsidy_program_2 == "X")
        .map(|s| s.address_id)
        .collect();
    assert_eq!(group.members, expected);
}

#[test]
fn dropping_a_value_never_grows_the_group() {
    let pop = population();
    let target = &pop[0];
    let wide = FilterSelection {
        subsidy_program_1: set(&["A", "B", "C"]),
        ..Default::default()
    };
    let mut last = resolve_benchmark(&pop, target, BenchmarkMode::Custom, &wide).unwrap().len();
    for narrowed in [set(&["A", "B"]), set(&["A"])] {
        let sel = FilterSelection {
            subsidy_program_1: narrowed,
            ..Default::default()
        };
        let n = resolve_benchmark(&pop, target, BenchmarkMode::Custom, &sel).unwrap().len();
        assert!(n <= last);
        last = n;
    }
}

#[test]
fn deselecting_everyone_is_an_empty_selection() {
    let pop = population();
    let target = &pop[0];
    let sel = FilterSelection {
        deselected: BTreeSet::from([2, 3, 4, 5, 6]),
        ..Default::default()
    };
    let err = resolve_benchmark(&pop, target, BenchmarkMode::Default, &sel).unwrap_err();
    assert!(err.is_empty_selection());
}

#[test]
fn empty_multiselect_is_an_empty_selection() {
    let pop = population();
    let sel = FilterSelection {
        subsidy_program_1: Some(BTreeSet::new()),
        ..Default::default()
    };
    let err = resolve_benchmark(&pop, &pop[0], BenchmarkMode::Custom, &sel).unwrap_err();
    assert!(matches!(err, BenchError::EmptySelection(_)));
}

#[test]
fn custom_options_span_the_whole_population() {
    let pop = population();
    let target = &pop[0];
    let sel = FilterSelection {
        states: set(&["NSW"]),
        ..Default::default()
    };
    let options = filter_options(&pop, target, BenchmarkMode::Custom, &sel);
    assert_eq!(options.states, BTreeSet::from(["NSW".to_string(), "VIC".to_string()]));
    assert_eq!(
        options.subsidy_program_1,
        BTreeSet::from(["A".to_string(), "B".to_string(), "C".to_string()])
    );
    assert_eq!(options.subsidy_program_2, BTreeSet::from(["X".to_string(), "Y".to_string()]));
}

#[test]
fn custom_cascade_keeps_selections_as_given() {
    let pop = population();
    let target = &pop[0];
    let sel = FilterSelection {
        states: set(&["NSW"]),
        subsidy_program_1: set(&["B"]),
        ..Default::default()
    };
    let (_, reconciled) = cascade(&pop, target, BenchmarkMode::Custom, &sel);
    assert_eq!(reconciled, sel);
    let err = resolve_benchmark(&pop, target, BenchmarkMode::Custom, &reconciled).unwrap_err();
    assert!(err.is_empty_selection());
}

#[test]
fn default_cascade_resets_stale_subsidy_selection() {
    let pop = population();
    let target = &pop[0];
    let sel = FilterSelection {
        subsidy_program_1: set(&["A"]),
        subsidy_program_2: set(&["Y"]),
        ..Default::default()
    };
    let (options, reconciled) = cascade(&pop, target, BenchmarkMode::Default, &sel);
    assert_eq!(
        options.subsidy_program_1,
        BTreeSet::from(["A".to_string(), "B".to_string(), "C".to_string()])
    );
    // Peers with sp1 = A are stores 2 and 3; their sp2 values are X and Y.
    assert_eq!(options.subsidy_program_2, BTreeSet::from(["X".to_string(), "Y".to_string()]));
    assert_eq!(reconciled.subsidy_program_2, set(&["Y"]));

    let narrowed = FilterSelection {
        subsidy_program_1: set(&["C"]),
        subsidy_program_2: set(&["Y"]),
        ..Default::default()
    };
    let (options, reconciled) = cascade(&pop, target, BenchmarkMode::Default, &narrowed);
    assert_eq!(options.subsidy_program_2, BTreeSet::from(["X".to_string()]));
    assert_eq!(reconciled.subsidy_program_2, None);
    let group = resolve_benchmark(&pop, target, BenchmarkMode::Default, &reconciled).unwrap();
    assert_eq!(group.members, BTreeSet::from([6]));
}

#[test]
fn removing_a_state_after_cascade_never_grows_the_group() {
    let pop = vec![
        store(1, "VIC", "METRO-A", "A", "X"),
        store(4, "VIC", "METRO-A", "B", "X"),
        store(5, "VIC", "METRO-A", "B", "X"),
        store(7, "NSW", "METRO-A", "A", "X"),
        store(8, "NSW", "METRO-A", "A", "X"),
        store(9, "NSW", "METRO-A", "A", "X"),
    ];
    let target = &pop[0];
    let resolved_len = |states: &[&str]| {
        let sel = FilterSelection {
            states: set(states),
            subsidy_program_1: set(&["B"]),
            ..Default::default()
        };
        let (_, reconciled) = cascade(&pop, target, BenchmarkMode::Custom, &sel);
        resolve_benchmark(&pop, target, BenchmarkMode::Custom, &reconciled).map_or(0, |g| g.len())
    };
    let both = resolved_len(&["NSW", "VIC"]);
    let nsw_only = resolved_len(&["NSW"]);
    assert_eq!(both, 2);
    assert!(nsw_only <= both, "removing VIC grew the group from {both} to {nsw_only}");
}

#[test]
fn unknown_store_is_reported() {
    let pop = population();
    assert_eq!(find_store(&pop, " 7 ").unwrap().address_id, 7);
    assert!(matches!(find_store(&pop, "Nowhere"), Err(BenchError::UnknownStore(_))));
}
