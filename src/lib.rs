//! store_bench
//!
//! Benchmark a retail store against a peer group of comparable stores and
//! derive chart-ready series from per-store, per-week sales aggregates.
//! Pairs with the `storebench` CLI.
//!
//! ### Features
//! - Resolve a benchmark peer group by state and channel/zone, or by custom filters
//! - Period calendar shared by every chart, so sparse stores keep a full time axis
//! - Sum-of-stores or average-per-store aggregation, warehouse/promotion shares and GP%
//! - Indexed and cumulative-indexed weekly series, basket and per-sqm views
//! - CSV/JSON output and SVG/PNG charts
//!
//! ### Example
//! ```no_run
//! use store_bench::{AggMode, BenchmarkMode, FilterSelection, Metric, Periodicity};
//! use store_bench::{benchmark, calendar, compose, slice, storage};
//!
//! let stores = storage::load_stores("stores.csv")?;
//! let target = benchmark::find_store(&stores, "1042")?;
//! let group = benchmark::resolve_benchmark(
//!     &stores,
//!     target,
//!     BenchmarkMode::Default,
//!     &FilterSelection::default(),
//! )?;
//! let rows = storage::load_transactions("transactions.csv", Some(&group.working_ids()))?;
//! let (target_rows, bench_rows) = slice::split_target_benchmark(&rows, target.address_id, &group);
//! let cal = calendar::build_calendar(&bench_rows);
//! let table = compose::compose_series_input(
//!     &bench_rows,
//!     Metric::Sales,
//!     Periodicity::Monthly,
//!     AggMode::AveragePerStore,
//!     &cal,
//! );
//! storage::save_csv(&table.rows, "benchmark_sales.csv")?;
//! # let _ = target_rows;
//! # Ok::<(), store_bench::BenchError>(())
//! ```

pub mod aggregate;
pub mod benchmark;
pub mod calendar;
pub mod compose;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod slice;
pub mod storage;
pub mod viz;

pub use benchmark::{BenchmarkGroup, BenchmarkMode, FilterSelection};
pub use calendar::PeriodCalendar;
pub use config::SessionConfig;
pub use error::{BenchError, Result};
pub use models::{
    AggMode, BasketMetric, BasketRow, Dimension, Indicator, Metric, PeriodId, PeriodKey,
    Periodicity, StoreRecord, TransactionRow,
};
pub use slice::{SliceFilter, ViewOption};
