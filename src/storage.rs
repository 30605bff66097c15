//! CSV input with header validation, CSV/JSON output, and a memoized loader.

use crate::error::{BenchError, Result};
use crate::models::{BasketRow, Flag, PeriodStamp, StoreRecord, TransactionRow, parse_fiscal_quarter};
use ahash::{AHashMap, AHashSet};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const STORE_COLUMNS: [&str; 10] = [
    "address_id",
    "store_name",
    "state",
    "channel_zone",
    "store_size",
    "subsidy_program_1",
    "subsidy_program_2",
    "store_address",
    "store_owner",
    "snapshot_week_end",
];

const PERIOD_COLUMNS: [&str; 7] = [
    "address_id",
    "week_end",
    "year_week",
    "month",
    "year",
    "fiscal_quarter",
    "fiscal_year",
];

pub const TRANSACTION_MEASURES: [&str; 6] = [
    "finance_department",
    "warehouse",
    "promotion",
    "sales_ex_tax",
    "gross_profit_ex_tax",
    "sales_qty",
];

pub const BASKET_MEASURES: [&str; 3] = ["store_baskets", "avg_basket_size", "avg_basket_value"];

fn require_columns(headers: &StringRecord, table: &str, columns: &[&str]) -> Result<()> {
    for col in columns {
        if !headers.iter().any(|h| h == *col) {
            return Err(BenchError::missing_column(table, col));
        }
    }
    Ok(())
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input)
}

fn admits(ids: Option<&AHashSet<u64>>, id: u64) -> bool {
    ids.is_none_or(|set| set.contains(&id))
}

#[derive(Debug, Deserialize)]
struct RawStore {
    address_id: u64,
    store_name: String,
    state: String,
    channel_zone: String,
    store_size: f64,
    subsidy_program_1: String,
    subsidy_program_2: String,
    store_address: String,
    store_owner: String,
    snapshot_week_end: NaiveDate,
}

impl From<RawStore> for StoreRecord {
    fn from(r: RawStore) -> Self {
        StoreRecord {
            address_id: r.address_id,
            store_name: r.store_name,
            state: r.state,
            channel_zone: r.channel_zone,
            store_size: r.store_size,
            subsidy_program_1: r.subsidy_program_1,
            subsidy_program_2: r.subsidy_program_2,
            store_address: r.store_address,
            store_owner: r.store_owner,
        }
    }
}

fn stamp(
    week_end: NaiveDate,
    year_week: u32,
    month: u32,
    year: i32,
    fiscal_quarter: &str,
    fiscal_year: i32,
) -> Result<PeriodStamp> {
    PeriodStamp::new(
        week_end,
        year_week,
        month,
        year,
        parse_fiscal_quarter(fiscal_quarter)?,
        fiscal_year,
    )
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    address_id: u64,
    week_end: NaiveDate,
    year_week: u32,
    month: u32,
    year: i32,
    fiscal_quarter: String,
    fiscal_year: i32,
    finance_department: String,
    warehouse: Flag,
    promotion: Flag,
    sales_ex_tax: f64,
    gross_profit_ex_tax: f64,
    sales_qty: f64,
    #[serde(default)]
    classification: Option<String>,
}

impl TryFrom<RawTransaction> for TransactionRow {
    type Error = BenchError;

    fn try_from(r: RawTransaction) -> Result<Self> {
        Ok(TransactionRow {
            address_id: r.address_id,
            stamp: stamp(
                r.week_end,
                r.year_week,
                r.month,
                r.year,
                &r.fiscal_quarter,
                r.fiscal_year,
            )?,
            finance_department: r.finance_department,
            warehouse: r.warehouse,
            promotion: r.promotion,
            sales_ex_tax: r.sales_ex_tax,
            gross_profit_ex_tax: r.gross_profit_ex_tax,
            sales_qty: r.sales_qty,
            classification: r.classification.filter(|c| !c.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawBasket {
    address_id: u64,
    week_end: NaiveDate,
    year_week: u32,
    month: u32,
    year: i32,
    fiscal_quarter: String,
    fiscal_year: i32,
    store_baskets: f64,
    avg_basket_size: f64,
    avg_basket_value: f64,
}

impl TryFrom<RawBasket> for BasketRow {
    type Error = BenchError;

    fn try_from(r: RawBasket) -> Result<Self> {
        Ok(BasketRow {
            address_id: r.address_id,
            stamp: stamp(
                r.week_end,
                r.year_week,
                r.month,
                r.year,
                &r.fiscal_quarter,
                r.fiscal_year,
            )?,
            store_baskets: r.store_baskets,
            avg_basket_size: r.avg_basket_size,
            avg_basket_value: r.avg_basket_value,
        })
    }
}

/// Read store snapshots and keep the latest snapshot per `address_id`.
///
/// Output is sorted by `address_id`. On equal snapshot dates the later line wins.
pub fn read_stores<R: Read>(input: R) -> Result<Vec<StoreRecord>> {
    let mut rdr = reader(input);
    require_columns(rdr.headers()?, "stores", &STORE_COLUMNS)?;
    let mut latest: AHashMap<u64, RawStore> = AHashMap::new();
    for rec in rdr.deserialize::<RawStore>() {
        let rec = rec?;
        match latest.get(&rec.address_id) {
            Some(prev) if prev.snapshot_week_end > rec.snapshot_week_end => {}
            _ => {
                latest.insert(rec.address_id, rec);
            }
        }
    }
    let mut stores: Vec<StoreRecord> = latest.into_values().map(StoreRecord::from).collect();
    stores.sort_by_key(|s| s.address_id);
    Ok(stores)
}

pub fn load_stores<P: AsRef<Path>>(path: P) -> Result<Vec<StoreRecord>> {
    let stores = read_stores(File::open(path.as_ref())?)?;
    log::info!("loaded {} stores from {}", stores.len(), path.as_ref().display());
    Ok(stores)
}

/// Read transaction rows, keeping those whose store is in `ids` (all when `None`).
pub fn read_transactions<R: Read>(
    input: R,
    ids: Option<&AHashSet<u64>>,
) -> Result<Vec<TransactionRow>> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, "transactions", &PERIOD_COLUMNS)?;
    require_columns(&headers, "transactions", &TRANSACTION_MEASURES)?;
    let mut out = Vec::new();
    for rec in rdr.deserialize::<RawTransaction>() {
        let rec = rec?;
        if admits(ids, rec.address_id) {
            out.push(TransactionRow::try_from(rec)?);
        }
    }
    Ok(out)
}

pub fn load_transactions<P: AsRef<Path>>(
    path: P,
    ids: Option<&AHashSet<u64>>,
) -> Result<Vec<TransactionRow>> {
    let rows = read_transactions(File::open(path.as_ref())?, ids)?;
    log::info!(
        "loaded {} transaction rows from {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows)
}

/// Read basket rows, keeping those whose store is in `ids` (all when `None`).
pub fn read_baskets<R: Read>(input: R, ids: Option<&AHashSet<u64>>) -> Result<Vec<BasketRow>> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, "baskets", &PERIOD_COLUMNS)?;
    require_columns(&headers, "baskets", &BASKET_MEASURES)?;
    let mut out = Vec::new();
    for rec in rdr.deserialize::<RawBasket>() {
        let rec = rec?;
        if admits(ids, rec.address_id) {
            out.push(BasketRow::try_from(rec)?);
        }
    }
    Ok(out)
}

pub fn load_baskets<P: AsRef<Path>>(path: P, ids: Option<&AHashSet<u64>>) -> Result<Vec<BasketRow>> {
    let rows = read_baskets(File::open(path.as_ref())?, ids)?;
    log::info!("loaded {} basket rows from {}", rows.len(), path.as_ref().display());
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// `json` for a `.json` extension, CSV for anything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

/// Save flat rows as CSV with a header taken from the field names.
pub fn save_csv<T: Serialize, P: AsRef<Path>>(rows: &[T], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save any serializable value as pretty JSON.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save rows in `format`, or the format implied by the extension.
pub fn save_rows<T: Serialize, P: AsRef<Path>>(
    rows: &[T],
    path: P,
    format: Option<OutputFormat>,
) -> Result<()> {
    let path = path.as_ref();
    match format.unwrap_or_else(|| OutputFormat::from_path(path)) {
        OutputFormat::Csv => save_csv(rows, path),
        OutputFormat::Json => save_json(rows, path),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    ids: Option<Vec<u64>>,
}

impl CacheKey {
    fn new(path: &Path, ids: Option<&AHashSet<u64>>) -> Self {
        let ids = ids.map(|set| {
            let mut v: Vec<u64> = set.iter().copied().collect();
            v.sort_unstable();
            v
        });
        CacheKey {
            path: path.to_path_buf(),
            ids,
        }
    }
}

/// Memoized loads keyed by (path, id set).
///
/// Entries are immutable once inserted and handed out as `Arc`s, so one cache
/// can be shared read-only between sessions.
#[derive(Debug, Default)]
pub struct LoadCache {
    transactions: RwLock<AHashMap<CacheKey, Arc<Vec<TransactionRow>>>>,
    baskets: RwLock<AHashMap<CacheKey, Arc<Vec<BasketRow>>>>,
}

fn cached<T, F>(
    map: &RwLock<AHashMap<CacheKey, Arc<Vec<T>>>>,
    key: CacheKey,
    load: F,
) -> Result<Arc<Vec<T>>>
where
    F: FnOnce() -> Result<Vec<T>>,
{
    if let Ok(guard) = map.read()
        && let Some(hit) = guard.get(&key)
    {
        log::debug!("cache hit for {}", key.path.display());
        return Ok(Arc::clone(hit));
    }
    let rows = Arc::new(load()?);
    // A poisoned lock only means another loader panicked; the map itself is still valid.
    let mut guard = map.write().unwrap_or_else(|e| e.into_inner());
    Ok(Arc::clone(guard.entry(key).or_insert(rows)))
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(
        &self,
        path: &Path,
        ids: Option<&AHashSet<u64>>,
    ) -> Result<Arc<Vec<TransactionRow>>> {
        cached(&self.transactions, CacheKey::new(path, ids), || {
            load_transactions(path, ids)
        })
    }

    pub fn baskets(&self, path: &Path, ids: Option<&AHashSet<u64>>) -> Result<Arc<Vec<BasketRow>>> {
        cached(&self.baskets, CacheKey::new(path, ids), || load_baskets(path, ids))
    }

    /// Number of cached entries across both tables.
    pub fn len(&self) -> usize {
        let t = self.transactions.read().map(|m| m.len()).unwrap_or(0);
        let b = self.baskets.read().map(|m| m.len()).unwrap_or(0);
        t + b
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
