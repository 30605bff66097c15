//! Benchmark peer-group resolution.
//!
//! Two modes:
//! - **Default**: peers share the target's state and channel/zone (both fixed),
//!   optionally narrowed by the two subsidy-program multi-selects. The target
//!   itself is not a member of its own default benchmark.
//! - **Custom**: peers come from the whole population, narrowed independently
//!   on all four attributes.
//!
//! In default mode the filters form a chain `{state, channel_zone} ->
//! subsidy_program_1 -> subsidy_program_2 -> members`. [`cascade`] derives the
//! options offered at each level from the selections upstream of it and drops
//! a selection that is no longer a subset of its options. In custom mode every
//! option set is the population's full distinct-value set.
//! [`resolve_benchmark`] never reconciles: it intersects exactly what it is given,
//! so removing a value from any selection can only shrink the result.

use crate::error::{BenchError, Result};
use crate::models::StoreRecord;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenchmarkMode {
    #[default]
    Default,
    Custom,
}

impl std::str::FromStr for BenchmarkMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(BenchmarkMode::Default),
            "custom" => Ok(BenchmarkMode::Custom),
            _ => Err(format!("unknown benchmark mode: {s}")),
        }
    }
}

/// The four categorical attributes used for peer matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSets {
    pub states: BTreeSet<String>,
    pub channel_zones: BTreeSet<String>,
    pub subsidy_program_1: BTreeSet<String>,
    pub subsidy_program_2: BTreeSet<String>,
}

/// User multi-select state. `None` means "everything offered" (the default).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub states: Option<BTreeSet<String>>,
    #[serde(default)]
    pub channel_zones: Option<BTreeSet<String>>,
    #[serde(default)]
    pub subsidy_program_1: Option<BTreeSet<String>>,
    #[serde(default)]
    pub subsidy_program_2: Option<BTreeSet<String>>,
    /// Stores manually unticked in the member grid.
    #[serde(default)]
    pub deselected: BTreeSet<u64>,
}

fn keep_if_subset(
    sel: &Option<BTreeSet<String>>,
    options: &BTreeSet<String>,
) -> Option<BTreeSet<String>> {
    match sel {
        Some(s) if s.is_subset(options) => Some(s.clone()),
        _ => None,
    }
}

fn admits(sel: &Option<BTreeSet<String>>, value: &str) -> bool {
    sel.as_ref().is_none_or(|s| s.contains(value))
}

impl FilterSelection {
    /// Keep each custom selection only while it is a subset of `options`;
    /// otherwise fall back to the default (all options).
    pub fn reconcile(&self, options: &AttributeSets) -> FilterSelection {
        FilterSelection {
            states: keep_if_subset(&self.states, &options.states),
            channel_zones: keep_if_subset(&self.channel_zones, &options.channel_zones),
            subsidy_program_1: keep_if_subset(&self.subsidy_program_1, &options.subsidy_program_1),
            subsidy_program_2: keep_if_subset(&self.subsidy_program_2, &options.subsidy_program_2),
            deselected: self.deselected.clone(),
        }
    }
}

/// A resolved peer group plus the criteria that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkGroup {
    pub target_id: u64,
    pub mode: BenchmarkMode,
    pub criteria: AttributeSets,
    pub members: BTreeSet<u64>,
}

impl BenchmarkGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, address_id: u64) -> bool {
        self.members.contains(&address_id)
    }

    /// Ids to load data for: the members plus the target, which is always
    /// needed for the target view even when it is not a member.
    pub fn working_ids(&self) -> AHashSet<u64> {
        let mut ids: AHashSet<u64> = self.members.iter().copied().collect();
        ids.insert(self.target_id);
        ids
    }

    /// Member store records in id order.
    pub fn member_stores<'a>(&self, population: &'a [StoreRecord]) -> Vec<&'a StoreRecord> {
        let mut out: Vec<&StoreRecord> = population
            .iter()
            .filter(|s| self.members.contains(&s.address_id))
            .collect();
        out.sort_by_key(|s| s.address_id);
        out
    }
}

/// Look up a store by numeric id or exact name.
pub fn find_store<'a>(population: &'a [StoreRecord], key: &str) -> Result<&'a StoreRecord> {
    let key = key.trim();
    let by_id = key
        .parse::<u64>()
        .ok()
        .and_then(|id| population.iter().find(|s| s.address_id == id));
    by_id
        .or_else(|| population.iter().find(|s| s.store_name == key))
        .ok_or_else(|| BenchError::UnknownStore(key.to_string()))
}

fn seed<'a>(
    population: &'a [StoreRecord],
    target: &StoreRecord,
    mode: BenchmarkMode,
) -> Vec<&'a StoreRecord> {
    match mode {
        BenchmarkMode::Default => population
            .iter()
            .filter(|s| {
                s.address_id != target.address_id
                    && s.state == target.state
                    && s.channel_zone == target.channel_zone
            })
            .collect(),
        BenchmarkMode::Custom => population.iter().collect(),
    }
}

fn distinct<'a, F>(stores: impl Iterator<Item = &'a StoreRecord>, field: F) -> BTreeSet<String>
where
    F: Fn(&StoreRecord) -> &str,
{
    stores.map(|s| field(s).to_string()).collect()
}

/// Options offered at each filter level and the selection reconciled against them.
///
/// In default mode state and channel/zone are fixed to the target's values and
/// any selection for them is ignored; the subsidy-program options then cascade
/// from the stores upstream, and a selection outside its options is reset.
/// Custom mode narrows independently: every option set spans the whole
/// population and the selection passes through untouched.
pub fn cascade(
    population: &[StoreRecord],
    target: &StoreRecord,
    mode: BenchmarkMode,
    selection: &FilterSelection,
) -> (AttributeSets, FilterSelection) {
    if mode == BenchmarkMode::Custom {
        let all = population.iter();
        let options = AttributeSets {
            states: distinct(all.clone(), |s| &s.state),
            channel_zones: distinct(all.clone(), |s| &s.channel_zone),
            subsidy_program_1: distinct(all.clone(), |s| &s.subsidy_program_1),
            subsidy_program_2: distinct(all, |s| &s.subsidy_program_2),
        };
        return (options, selection.clone());
    }

    let seeded = seed(population, target, mode);
    let sp1 = distinct(seeded.iter().copied(), |s| &s.subsidy_program_1);
    let sel_sp1 = keep_if_subset(&selection.subsidy_program_1, &sp1);

    let level2 = seeded
        .iter()
        .copied()
        .filter(|s| admits(&sel_sp1, &s.subsidy_program_1));
    let sp2 = distinct(level2, |s| &s.subsidy_program_2);
    let sel_sp2 = keep_if_subset(&selection.subsidy_program_2, &sp2);

    (
        AttributeSets {
            states: BTreeSet::from([target.state.clone()]),
            channel_zones: BTreeSet::from([target.channel_zone.clone()]),
            subsidy_program_1: sp1,
            subsidy_program_2: sp2,
        },
        FilterSelection {
            states: None,
            channel_zones: None,
            subsidy_program_1: sel_sp1,
            subsidy_program_2: sel_sp2,
            deselected: selection.deselected.clone(),
        },
    )
}

/// Default values for every multi-select given the current upstream selections.
pub fn filter_options(
    population: &[StoreRecord],
    target: &StoreRecord,
    mode: BenchmarkMode,
    selection: &FilterSelection,
) -> AttributeSets {
    cascade(population, target, mode, selection).0
}

/// Resolve the benchmark members for `target`.
///
/// Members are the seed stores admitted by every selection, minus the manually
/// deselected ids. An empty result is reported as
/// [`BenchError::EmptySelection`] so callers can prompt for a wider filter.
pub fn resolve_benchmark(
    population: &[StoreRecord],
    target: &StoreRecord,
    mode: BenchmarkMode,
    selection: &FilterSelection,
) -> Result<BenchmarkGroup> {
    let (sel_states, sel_zones) = match mode {
        BenchmarkMode::Default => {
            if selection.states.is_some() || selection.channel_zones.is_some() {
                log::debug!("state/channel-zone selections ignored in default mode");
            }
            (None, None)
        }
        BenchmarkMode::Custom => (selection.states.clone(), selection.channel_zones.clone()),
    };

    let members: BTreeSet<u64> = seed(population, target, mode)
        .into_iter()
        .filter(|s| {
            admits(&sel_states, &s.state)
                && admits(&sel_zones, &s.channel_zone)
                && admits(&selection.subsidy_program_1, &s.subsidy_program_1)
                && admits(&selection.subsidy_program_2, &s.subsidy_program_2)
                && !selection.deselected.contains(&s.address_id)
        })
        .map(|s| s.address_id)
        .collect();

    if members.is_empty() {
        return Err(BenchError::EmptySelection(format!(
            "no stores match the {} benchmark filters for store {}",
            match mode {
                BenchmarkMode::Default => "default",
                BenchmarkMode::Custom => "custom",
            },
            target.address_id
        )));
    }

    let options = filter_options(population, target, mode, selection);
    let pick = |sel: &Option<BTreeSet<String>>, opts: &BTreeSet<String>| {
        sel.clone().unwrap_or_else(|| opts.clone())
    };
    let criteria = AttributeSets {
        states: pick(&sel_states, &options.states),
        channel_zones: pick(&sel_zones, &options.channel_zones),
        subsidy_program_1: pick(&selection.subsidy_program_1, &options.subsidy_program_1),
        subsidy_program_2: pick(&selection.subsidy_program_2, &options.subsidy_program_2),
    };
    log::debug!(
        "benchmark for {}: {} members ({:?} mode)",
        target.address_id,
        members.len(),
        mode
    );

    Ok(BenchmarkGroup {
        target_id: target.address_id,
        mode,
        criteria,
        members,
    })
}
