use crate::error::{BenchError, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTH_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Short month name (`1` -> `"Jan"`). Out-of-range months render as `"M13"`.
pub fn month_abbr(month: u32) -> String {
    match month {
        1..=12 => MONTH_ABBR[(month - 1) as usize].to_string(),
        m => format!("M{m}"),
    }
}

/// Full month name (`1` -> `"January"`).
pub fn month_full(month: u32) -> String {
    match month {
        1..=12 => MONTH_FULL[(month - 1) as usize].to_string(),
        m => format!("M{m}"),
    }
}

/// Binary Y/N indicator as stored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
    Y,
    N,
}

impl Flag {
    pub fn is_yes(self) -> bool {
        self == Flag::Y
    }
}

/// One physical store (latest snapshot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreRecord {
    pub address_id: u64,
    pub store_name: String,
    pub state: String,
    pub channel_zone: String,
    /// Floor area in square metres.
    pub store_size: f64,
    pub subsidy_program_1: String,
    pub subsidy_program_2: String,
    pub store_address: String,
    pub store_owner: String,
}

/// Period fields shared by every transactional table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodStamp {
    /// Promotional week end date.
    pub week_end: NaiveDate,
    /// Week number within the promotional year.
    pub year_week: u32,
    pub month: u32,
    /// Promotional (calendar) year.
    pub year: i32,
    /// Fiscal quarter number, 1..=4.
    pub fiscal_quarter: u8,
    pub fiscal_year: i32,
}

impl PeriodStamp {
    /// Build a stamp, validating month and quarter ranges.
    pub fn new(
        week_end: NaiveDate,
        year_week: u32,
        month: u32,
        year: i32,
        fiscal_quarter: u8,
        fiscal_year: i32,
    ) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(BenchError::InvalidPeriod {
                column: "month".into(),
                value: month.to_string(),
            });
        }
        if !(1..=4).contains(&fiscal_quarter) {
            return Err(BenchError::InvalidPeriod {
                column: "fiscal_quarter".into(),
                value: fiscal_quarter.to_string(),
            });
        }
        Ok(Self {
            week_end,
            year_week,
            month,
            year,
            fiscal_quarter,
            fiscal_year,
        })
    }

    /// The (period, year) key this row falls into for a periodicity.
    pub fn key(&self, periodicity: Periodicity) -> PeriodKey {
        let period = match periodicity {
            Periodicity::YoyQuarterly => PeriodId::FiscalQuarter(self.fiscal_quarter),
            Periodicity::YoyMonthly => PeriodId::Month(self.month),
            Periodicity::YoyWeekly => PeriodId::YearWeek(self.year_week),
            Periodicity::Quarterly => PeriodId::QuarterOfYear {
                year: self.fiscal_year,
                quarter: self.fiscal_quarter,
            },
            Periodicity::Monthly => PeriodId::MonthOfYear {
                year: self.year,
                month: self.month,
            },
            Periodicity::Weekly => PeriodId::WeekEnd(self.week_end),
        };
        let year = if periodicity.is_fiscal() {
            self.fiscal_year
        } else {
            self.year
        };
        PeriodKey { period, year }
    }
}

/// Parse a fiscal quarter name such as `Q3` or `Q3 FY24` into its number.
pub fn parse_fiscal_quarter(s: &str) -> Result<u8> {
    static QUARTER: OnceLock<Regex> = OnceLock::new();
    let re = QUARTER.get_or_init(|| Regex::new(r"(?i)^\s*Q([1-4])\b").expect("static regex"));
    re.captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .ok_or_else(|| BenchError::InvalidPeriod {
            column: "fiscal_quarter".into(),
            value: s.to_string(),
        })
}

/// Access to the store id and period fields of a row.
pub trait Periodic {
    fn address_id(&self) -> u64;
    fn stamp(&self) -> &PeriodStamp;
}

/// One (store, week, department, flags) aggregate of sales facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub address_id: u64,
    pub stamp: PeriodStamp,
    pub finance_department: String,
    pub warehouse: Flag,
    pub promotion: Flag,
    pub sales_ex_tax: f64,
    pub gross_profit_ex_tax: f64,
    pub sales_qty: f64,
    /// Product classification used by the sales-profile view; not every extract carries it.
    pub classification: Option<String>,
}

impl TransactionRow {
    pub fn measure(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Sales => self.sales_ex_tax,
            Metric::GrossProfit => self.gross_profit_ex_tax,
            Metric::Units => self.sales_qty,
        }
    }

    pub fn flag(&self, indicator: Indicator) -> Flag {
        match indicator {
            Indicator::Warehouse => self.warehouse,
            Indicator::Promotion => self.promotion,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::FinanceDepartment => Some(self.finance_department.as_str()),
            Dimension::Classification => self.classification.as_deref(),
        }
    }
}

impl Periodic for TransactionRow {
    fn address_id(&self) -> u64 {
        self.address_id
    }
    fn stamp(&self) -> &PeriodStamp {
        &self.stamp
    }
}

/// Per-store, per-week basket statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketRow {
    pub address_id: u64,
    pub stamp: PeriodStamp,
    pub store_baskets: f64,
    pub avg_basket_size: f64,
    pub avg_basket_value: f64,
}

impl BasketRow {
    pub fn measure(&self, metric: BasketMetric) -> f64 {
        match metric {
            BasketMetric::Baskets => self.store_baskets,
            BasketMetric::AvgBasketSize => self.avg_basket_size,
            BasketMetric::AvgBasketValue => self.avg_basket_value,
        }
    }
}

impl Periodic for BasketRow {
    fn address_id(&self) -> u64 {
        self.address_id
    }
    fn stamp(&self) -> &PeriodStamp {
        &self.stamp
    }
}

/// Typed period identifier. All ids within one periodicity share a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodId {
    FiscalQuarter(u8),
    Month(u32),
    YearWeek(u32),
    QuarterOfYear { year: i32, quarter: u8 },
    MonthOfYear { year: i32, month: u32 },
    WeekEnd(NaiveDate),
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PeriodId::FiscalQuarter(q) => write!(f, "Q{q}"),
            PeriodId::Month(m) => write!(f, "{}", month_abbr(m)),
            PeriodId::YearWeek(w) => write!(f, "W{w:02}"),
            PeriodId::QuarterOfYear { year, quarter } => write!(f, "Q{quarter}-{year}"),
            PeriodId::MonthOfYear { year, month } => write!(f, "{}-{year}", month_abbr(month)),
            PeriodId::WeekEnd(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for PeriodId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A (period, year) pair. Ordered by year first, then period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PeriodKey {
    pub period: PeriodId,
    pub year: i32,
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.period.cmp(&other.period))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Column names backing a periodicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodColumns {
    pub period: &'static str,
    pub year: &'static str,
    pub label: &'static str,
}

/// Time granularity of a chart, including the year-over-year projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Periodicity {
    YoyQuarterly,
    YoyMonthly,
    YoyWeekly,
    Quarterly,
    Monthly,
    Weekly,
}

impl Periodicity {
    pub const ALL: [Periodicity; 6] = [
        Periodicity::YoyQuarterly,
        Periodicity::YoyMonthly,
        Periodicity::YoyWeekly,
        Periodicity::Quarterly,
        Periodicity::Monthly,
        Periodicity::Weekly,
    ];

    pub fn columns(self) -> PeriodColumns {
        match self {
            Periodicity::YoyQuarterly => PeriodColumns {
                period: "fiscal_quarter",
                year: "fiscal_year",
                label: "YoY - Quarterly",
            },
            Periodicity::YoyMonthly => PeriodColumns {
                period: "month",
                year: "year",
                label: "YoY - Monthly",
            },
            Periodicity::YoyWeekly => PeriodColumns {
                period: "year_week",
                year: "year",
                label: "YoY - Weekly",
            },
            Periodicity::Quarterly => PeriodColumns {
                period: "fiscal_quarter_year",
                year: "fiscal_year",
                label: "Quarterly",
            },
            Periodicity::Monthly => PeriodColumns {
                period: "month_year",
                year: "year",
                label: "Monthly",
            },
            Periodicity::Weekly => PeriodColumns {
                period: "week_end",
                year: "year",
                label: "Weekly",
            },
        }
    }

    pub fn label(self) -> &'static str {
        self.columns().label
    }

    pub fn is_yoy(self) -> bool {
        matches!(
            self,
            Periodicity::YoyQuarterly | Periodicity::YoyMonthly | Periodicity::YoyWeekly
        )
    }

    /// Quarter periodicities pair with the fiscal year instead of the promotional year.
    pub fn is_fiscal(self) -> bool {
        matches!(self, Periodicity::YoyQuarterly | Periodicity::Quarterly)
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Periodicity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '_'], "");
        match norm.as_str() {
            "yoy-quarterly" | "yoyquarterly" => Ok(Periodicity::YoyQuarterly),
            "yoy-monthly" | "yoymonthly" => Ok(Periodicity::YoyMonthly),
            "yoy-weekly" | "yoyweekly" => Ok(Periodicity::YoyWeekly),
            "quarterly" => Ok(Periodicity::Quarterly),
            "monthly" => Ok(Periodicity::Monthly),
            "weekly" => Ok(Periodicity::Weekly),
            _ => Err(format!("unknown periodicity: {s}")),
        }
    }
}

/// How store-level values are combined into a benchmark value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggMode {
    SumOfStores,
    AveragePerStore,
}

impl AggMode {
    pub fn label(self) -> &'static str {
        match self {
            AggMode::SumOfStores => "Sum of Stores",
            AggMode::AveragePerStore => "Average per Store",
        }
    }
}

impl FromStr for AggMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "-").as_str() {
            "sum" | "sum-of-stores" => Ok(AggMode::SumOfStores),
            "average" | "avg" | "average-per-store" => Ok(AggMode::AveragePerStore),
            _ => Err(format!("unknown aggregation mode: {s}")),
        }
    }
}

/// Sales measures carried by [`TransactionRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Sales,
    GrossProfit,
    Units,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::Sales => "sales_ex_tax",
            Metric::GrossProfit => "gross_profit_ex_tax",
            Metric::Units => "sales_qty",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Sales => "Sales ex Tax",
            Metric::GrossProfit => "Gross Profit ex Tax",
            Metric::Units => "Units",
        }
    }

    /// Currency measures get `$` formatting; unit counts don't.
    pub fn is_currency(self) -> bool {
        !matches!(self, Metric::Units)
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "sales" | "sales-ex-tax" => Ok(Metric::Sales),
            "gp" | "gross-profit" | "gross-profit-ex-tax" => Ok(Metric::GrossProfit),
            "units" | "sales-qty" => Ok(Metric::Units),
            _ => Err(format!("unknown metric: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasketMetric {
    Baskets,
    AvgBasketSize,
    AvgBasketValue,
}

impl BasketMetric {
    pub const ALL: [BasketMetric; 3] = [
        BasketMetric::Baskets,
        BasketMetric::AvgBasketSize,
        BasketMetric::AvgBasketValue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BasketMetric::Baskets => "Avg Total Baskets",
            BasketMetric::AvgBasketSize => "Avg Basket Size",
            BasketMetric::AvgBasketValue => "Avg Basket Value",
        }
    }
}

/// Y/N columns used for share-of-total ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    Warehouse,
    Promotion,
}

impl Indicator {
    pub fn column(self) -> &'static str {
        match self {
            Indicator::Warehouse => "warehouse",
            Indicator::Promotion => "promotion",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Warehouse => "Warehouse",
            Indicator::Promotion => "Promotions",
        }
    }
}

/// Categorical columns a composition view can split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    FinanceDepartment,
    Classification,
}

impl Dimension {
    pub fn column(self) -> &'static str {
        match self {
            Dimension::FinanceDepartment => "finance_department",
            Dimension::Classification => "classification",
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "department" | "finance-department" => Ok(Dimension::FinanceDepartment),
            "classification" => Ok(Dimension::Classification),
            _ => Err(format!("unknown dimension: {s}")),
        }
    }
}
