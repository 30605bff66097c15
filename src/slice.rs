//! Row-level slicing applied before composing a chart.
//!
//! Stages run in a fixed order: promotion status, sales type, category preset,
//! department multi-select, date range. The department options offered to the
//! user are whatever survives the first three stages.

use crate::benchmark::BenchmarkGroup;
use crate::error::{BenchError, Result};
use crate::models::{Flag, Periodic, TransactionRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionStatus {
    #[default]
    All,
    NonPromoOnly,
    PromoOnly,
}

impl PromotionStatus {
    fn admits(self, flag: Flag) -> bool {
        match self {
            PromotionStatus::All => true,
            PromotionStatus::NonPromoOnly => flag == Flag::N,
            PromotionStatus::PromoOnly => flag == Flag::Y,
        }
    }
}

impl FromStr for PromotionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "all" => Ok(PromotionStatus::All),
            "non-promo" | "non-promo-only" | "non-promotional" => Ok(PromotionStatus::NonPromoOnly),
            "promo" | "promo-only" | "promotional" => Ok(PromotionStatus::PromoOnly),
            _ => Err(format!("unknown promotion status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SalesType {
    #[default]
    All,
    Warehouse,
    ThirdParty,
}

impl SalesType {
    fn admits(self, flag: Flag) -> bool {
        match self {
            SalesType::All => true,
            SalesType::Warehouse => flag == Flag::Y,
            SalesType::ThirdParty => flag == Flag::N,
        }
    }
}

impl FromStr for SalesType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "all" => Ok(SalesType::All),
            "warehouse" => Ok(SalesType::Warehouse),
            "third-party" | "3rd-party" => Ok(SalesType::ThirdParty),
            _ => Err(format!("unknown sales type: {s}")),
        }
    }
}

/// Named department groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryPreset {
    #[default]
    All,
    Core,
    Fresh,
    TobaccoLiquor,
    /// No preset; only the department multi-select narrows.
    Custom,
}

impl CategoryPreset {
    /// Departments in the preset, or `None` when the preset does not restrict.
    pub fn departments(self) -> Option<&'static [&'static str]> {
        match self {
            CategoryPreset::All | CategoryPreset::Custom => None,
            CategoryPreset::Core => Some(&["GROCERY", "DAIRY", "FROZEN", "VARIETY"]),
            CategoryPreset::Fresh => Some(&["BAKERY", "DELI", "FRUIT & VEG", "MEAT", "OTHER", "SEAFOOD"]),
            CategoryPreset::TobaccoLiquor => Some(&["TOBACCO", "LIQUOR"]),
        }
    }

    fn admits(self, department: &str) -> bool {
        self.departments().is_none_or(|list| {
            let d = department.trim();
            list.iter().any(|p| p.eq_ignore_ascii_case(d))
        })
    }
}

impl FromStr for CategoryPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_', '&'], "-").as_str() {
            "all" => Ok(CategoryPreset::All),
            "core" => Ok(CategoryPreset::Core),
            "fresh" => Ok(CategoryPreset::Fresh),
            "tobacco-liquor" | "tobacco---liquor" | "tobacco-and-liquor" => {
                Ok(CategoryPreset::TobaccoLiquor)
            }
            "custom" => Ok(CategoryPreset::Custom),
            _ => Err(format!("unknown category preset: {s}")),
        }
    }
}

/// Which slices a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewOption {
    Target,
    #[default]
    TargetVsBenchmark,
    Benchmark,
}

impl ViewOption {
    pub fn shows_target(self) -> bool {
        matches!(self, ViewOption::Target | ViewOption::TargetVsBenchmark)
    }

    pub fn shows_benchmark(self) -> bool {
        matches!(self, ViewOption::Benchmark | ViewOption::TargetVsBenchmark)
    }
}

impl fmt::Display for ViewOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewOption::Target => "Target",
            ViewOption::TargetVsBenchmark => "Target vs Benchmark",
            ViewOption::Benchmark => "Benchmark",
        })
    }
}

impl FromStr for ViewOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "target" => Ok(ViewOption::Target),
            "target-vs-benchmark" | "both" => Ok(ViewOption::TargetVsBenchmark),
            "benchmark" => Ok(ViewOption::Benchmark),
            _ => Err(format!("unknown view: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceFilter {
    #[serde(default)]
    pub promotion: PromotionStatus,
    #[serde(default)]
    pub sales_type: SalesType,
    #[serde(default)]
    pub category: CategoryPreset,
    /// `None` selects every department offered after the preset.
    #[serde(default)]
    pub departments: Option<BTreeSet<String>>,
    /// Inclusive week-end range.
    #[serde(default)]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl SliceFilter {
    fn admits_stages(&self, r: &TransactionRow) -> bool {
        self.promotion.admits(r.promotion)
            && self.sales_type.admits(r.warehouse)
            && self.category.admits(&r.finance_department)
    }

    /// Whether a week end falls inside the (inclusive) date range, if any.
    pub fn in_date_range(&self, week_end: NaiveDate) -> bool {
        self.date_range
            .is_none_or(|(from, to)| week_end >= from && week_end <= to)
    }

    /// Drop a department selection that is no longer a subset of `options`.
    pub fn reconcile(&self, options: &BTreeSet<String>) -> SliceFilter {
        let departments = match &self.departments {
            Some(sel) if sel.is_subset(options) => Some(sel.clone()),
            _ => None,
        };
        SliceFilter {
            departments,
            ..self.clone()
        }
    }
}

/// Departments remaining after the promotion, sales-type and category stages.
pub fn department_options(rows: &[TransactionRow], filter: &SliceFilter) -> BTreeSet<String> {
    rows.iter()
        .filter(|r| filter.admits_stages(r))
        .map(|r| r.finance_department.clone())
        .collect()
}

/// Apply every stage of `filter`.
///
/// An explicitly empty department selection is an [`BenchError::EmptySelection`];
/// a filter that merely matches no rows returns an empty slice.
pub fn apply_slice(rows: &[TransactionRow], filter: &SliceFilter) -> Result<Vec<TransactionRow>> {
    if let Some(deps) = &filter.departments
        && deps.is_empty()
    {
        return Err(BenchError::EmptySelection(
            "no departments selected; choose at least one department".into(),
        ));
    }
    let out: Vec<TransactionRow> = rows
        .iter()
        .filter(|r| filter.admits_stages(r))
        .filter(|r| {
            filter
                .departments
                .as_ref()
                .is_none_or(|d| d.contains(&r.finance_department))
        })
        .filter(|r| filter.in_date_range(r.stamp.week_end))
        .cloned()
        .collect();
    log::debug!("slice kept {} of {} rows", out.len(), rows.len());
    Ok(out)
}

/// Rows inside the filter's date range; the other stages are not applied.
///
/// The period calendar is built from the benchmark rows passed through this,
/// so the time axis follows the date window without depending on the
/// promotion, sales-type or department picks.
pub fn clip_to_dates<R>(rows: &[R], filter: &SliceFilter) -> Vec<R>
where
    R: Periodic + Clone,
{
    rows.iter()
        .filter(|r| filter.in_date_range(r.stamp().week_end))
        .cloned()
        .collect()
}

/// Partition loaded rows into (target slice, benchmark slice).
///
/// A store that is both the target and a benchmark member lands in both.
pub fn split_target_benchmark<R>(rows: &[R], target_id: u64, group: &BenchmarkGroup) -> (Vec<R>, Vec<R>)
where
    R: Periodic + Clone,
{
    let target = rows
        .iter()
        .filter(|r| r.address_id() == target_id)
        .cloned()
        .collect();
    let benchmark = rows
        .iter()
        .filter(|r| group.contains(r.address_id()))
        .cloned()
        .collect();
    (target, benchmark)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_case_insensitively() {
        assert!(CategoryPreset::Fresh.admits("Fruit & Veg"));
        assert!(!CategoryPreset::Core.admits("BAKERY"));
        assert!(CategoryPreset::Custom.admits("ANYTHING"));
    }

    #[test]
    fn parse_names() {
        assert_eq!(
            "tobacco-liquor".parse::<CategoryPreset>().unwrap(),
            CategoryPreset::TobaccoLiquor
        );
        assert_eq!("3rd party".parse::<SalesType>().unwrap(), SalesType::ThirdParty);
        assert_eq!(
            "non-promo".parse::<PromotionStatus>().unwrap(),
            PromotionStatus::NonPromoOnly
        );
        assert_eq!(
            "Target vs Benchmark".parse::<ViewOption>().unwrap(),
            ViewOption::TargetVsBenchmark
        );
    }

    #[test]
    fn reconcile_resets_stale_selection() {
        let f = SliceFilter {
            departments: Some(BTreeSet::from(["DELI".to_string()])),
            ..Default::default()
        };
        let opts = BTreeSet::from(["GROCERY".to_string()]);
        assert_eq!(f.reconcile(&opts).departments, None);
        let opts = BTreeSet::from(["DELI".to_string(), "GROCERY".to_string()]);
        assert!(f.reconcile(&opts).departments.is_some());
    }
}
