use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use store_bench::benchmark::{self, BenchmarkGroup, BenchmarkMode};
use store_bench::compose::{self, SeriesTable};
use store_bench::config::{self, SessionConfig};
use store_bench::index::{self, IndexedSeries};
use store_bench::slice::{
    self, CategoryPreset, PromotionStatus, SalesType, SliceFilter, ViewOption,
};
use store_bench::storage::{self, LoadCache, OutputFormat};
use store_bench::viz::{self, ChartOptions, LegendMode, RatioKind};
use store_bench::{
    AggMode, BasketMetric, BenchError, Dimension, Metric, PeriodCalendar, Periodicity,
    StoreRecord, TransactionRow,
};

#[derive(Parser, Debug)]
#[command(
    name = "storebench",
    version,
    about = "Benchmark a store against its peers and export chart-ready series"
)]
struct Cli {
    /// Store attribute CSV (one snapshot per store and week).
    #[arg(long, global = true)]
    stores: Option<PathBuf>,
    /// Session config (JSON). Command-line flags override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stores, or show one store's attributes.
    Stores(StoresArgs),
    /// Resolve and print the benchmark group for a target store.
    Benchmark(BenchmarkArgs),
    /// Period totals with warehouse %, promotion % and GP%.
    Series(SeriesArgs),
    /// Basket count, size and value per period.
    Baskets(BasketArgs),
    /// Composition by department or classification.
    Profile(ProfileArgs),
    /// Weekly series rebased to 100.
    Index(IndexArgs),
    /// Monthly value per square metre for every store.
    Area(AreaArgs),
}

#[derive(Args, Debug)]
struct StoresArgs {
    /// Store id or name.
    #[arg(long)]
    store: Option<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug, Default)]
struct GroupArgs {
    /// Target store id or name.
    #[arg(short, long)]
    target: Option<String>,
    /// Benchmark mode: default or custom.
    #[arg(long)]
    mode: Option<BenchmarkMode>,
    /// States to keep (custom mode), comma separated.
    #[arg(long)]
    states: Option<String>,
    /// Channel/zones to keep (custom mode), comma separated.
    #[arg(long)]
    channel_zones: Option<String>,
    /// Subsidy program 1 values to keep, comma separated.
    #[arg(long)]
    subsidy1: Option<String>,
    /// Subsidy program 2 values to keep, comma separated.
    #[arg(long)]
    subsidy2: Option<String>,
    /// Store ids to drop from the resolved group, comma separated.
    #[arg(long)]
    deselect: Option<String>,
}

#[derive(Args, Debug, Default)]
struct SliceArgs {
    #[arg(long)]
    promotion: Option<PromotionStatus>,
    #[arg(long)]
    sales_type: Option<SalesType>,
    #[arg(long)]
    category: Option<CategoryPreset>,
    /// Departments to keep, comma separated.
    #[arg(long)]
    departments: Option<String>,
    /// First week end to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last week end to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
struct ViewArgs {
    #[arg(long)]
    periodicity: Option<Periodicity>,
    #[arg(long)]
    agg_mode: Option<AggMode>,
    #[arg(long)]
    metric: Option<Metric>,
    /// target, benchmark or target-vs-benchmark.
    #[arg(long)]
    view: Option<ViewOption>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json).
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Create a chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 700)]
    height: u32,
    /// Legend placement: inside, right, top or bottom.
    #[arg(long, default_value = "bottom")]
    legend: LegendMode,
    /// Number locale for tick labels (en, de, fr, ...).
    #[arg(long, default_value = "en")]
    locale: String,
    /// Chart title (derived from the data when omitted).
    #[arg(long)]
    title: Option<String>,
}

impl OutputArgs {
    fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.width,
            height: self.height,
            locale: self.locale.clone(),
            legend: self.legend,
            title: self.title.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct BenchmarkArgs {
    #[command(flatten)]
    group: GroupArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct SeriesArgs {
    /// Transaction aggregate CSV.
    #[arg(long)]
    transactions: Option<PathBuf>,
    /// What the chart shows: value, warehouse, promotion or gp.
    #[arg(long, default_value = "value")]
    chart: String,
    #[command(flatten)]
    group: GroupArgs,
    #[command(flatten)]
    slice: SliceArgs,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct BasketArgs {
    /// Basket statistics CSV.
    #[arg(long)]
    baskets: Option<PathBuf>,
    /// Statistic to chart: baskets, size or value.
    #[arg(long, default_value = "baskets")]
    basket_metric: String,
    #[command(flatten)]
    group: GroupArgs,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    transactions: Option<PathBuf>,
    /// department or classification.
    #[arg(long, default_value = "department")]
    dimension: Dimension,
    #[command(flatten)]
    group: GroupArgs,
    #[command(flatten)]
    slice: SliceArgs,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct IndexArgs {
    #[arg(long)]
    transactions: Option<PathBuf>,
    /// Rebase the running total instead of the weekly values.
    #[arg(long, default_value_t = false)]
    cumulative: bool,
    #[command(flatten)]
    group: GroupArgs,
    #[command(flatten)]
    slice: SliceArgs,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct AreaArgs {
    #[arg(long)]
    transactions: Option<PathBuf>,
    #[command(flatten)]
    group: GroupArgs,
    #[command(flatten)]
    slice: SliceArgs,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    output: OutputArgs,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_set(s: &Option<String>) -> Option<BTreeSet<String>> {
    s.as_deref().map(|v| parse_list(v).into_iter().collect())
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

/// `sales.csv` + `target` -> `sales_target.csv` when more than one slice is written.
fn slice_path(path: &Path, name: &str, multiple: bool) -> PathBuf {
    if !multiple {
        return path.to_path_buf();
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let file = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{name}.{ext}"),
        None => format!("{stem}_{name}"),
    };
    path.with_file_name(file)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let Err(e) = run(cli) else {
        return Ok(());
    };
    if let Some(BenchError::EmptySelection(msg)) = e.downcast_ref::<BenchError>() {
        eprintln!("Nothing to show: {msg}.");
        eprintln!("Widen the benchmark or department filters and try again.");
        std::process::exit(2);
    }
    Err(e)
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = match cli.config.as_ref() {
        Some(p) => config::load_config(p)
            .with_context(|| format!("reading config {}", p.display()))?,
        None => SessionConfig::default(),
    };
    if cli.stores.is_some() {
        cfg.stores = cli.stores.clone();
    }
    let Some(stores_path) = cfg.stores.clone() else {
        bail!("no store file given; pass --stores or set `stores` in the config");
    };
    let stores = storage::load_stores(&stores_path)
        .with_context(|| format!("loading stores from {}", stores_path.display()))?;

    match cli.cmd {
        Command::Stores(args) => cmd_stores(&stores, args),
        Command::Benchmark(args) => {
            apply_group(&mut cfg, &args.group);
            cmd_benchmark(&stores, &cfg, args.output)
        }
        Command::Series(args) => {
            apply_group(&mut cfg, &args.group);
            apply_slice(&mut cfg, &args.slice);
            apply_view(&mut cfg, &args.view);
            if args.transactions.is_some() {
                cfg.transactions = args.transactions.clone();
            }
            cmd_series(&stores, &cfg, &args)
        }
        Command::Baskets(args) => {
            apply_group(&mut cfg, &args.group);
            apply_view(&mut cfg, &args.view);
            apply_dates(&mut cfg, args.from, args.to);
            if args.baskets.is_some() {
                cfg.baskets = args.baskets.clone();
            }
            cmd_baskets(&stores, &cfg, &args)
        }
        Command::Profile(args) => {
            apply_group(&mut cfg, &args.group);
            apply_slice(&mut cfg, &args.slice);
            apply_view(&mut cfg, &args.view);
            if args.transactions.is_some() {
                cfg.transactions = args.transactions.clone();
            }
            cmd_profile(&stores, &cfg, &args)
        }
        Command::Index(args) => {
            apply_group(&mut cfg, &args.group);
            apply_slice(&mut cfg, &args.slice);
            apply_view(&mut cfg, &args.view);
            if args.transactions.is_some() {
                cfg.transactions = args.transactions.clone();
            }
            cmd_index(&stores, &cfg, &args)
        }
        Command::Area(args) => {
            apply_group(&mut cfg, &args.group);
            apply_slice(&mut cfg, &args.slice);
            apply_view(&mut cfg, &args.view);
            if args.transactions.is_some() {
                cfg.transactions = args.transactions.clone();
            }
            cmd_area(&stores, &cfg, &args)
        }
    }
}

fn apply_group(cfg: &mut SessionConfig, g: &GroupArgs) {
    if g.target.is_some() {
        cfg.target = g.target.clone();
    }
    if let Some(m) = g.mode {
        cfg.mode = m;
    }
    if let Some(s) = parse_set(&g.states) {
        cfg.filters.states = Some(s);
    }
    if let Some(s) = parse_set(&g.channel_zones) {
        cfg.filters.channel_zones = Some(s);
    }
    if let Some(s) = parse_set(&g.subsidy1) {
        cfg.filters.subsidy_program_1 = Some(s);
    }
    if let Some(s) = parse_set(&g.subsidy2) {
        cfg.filters.subsidy_program_2 = Some(s);
    }
    if let Some(d) = g.deselect.as_deref() {
        cfg.filters
            .deselected
            .extend(parse_list(d).iter().filter_map(|x| x.parse::<u64>().ok()));
    }
}

fn apply_slice(cfg: &mut SessionConfig, s: &SliceArgs) {
    if let Some(p) = s.promotion {
        cfg.slice.promotion = p;
    }
    if let Some(t) = s.sales_type {
        cfg.slice.sales_type = t;
    }
    if let Some(c) = s.category {
        cfg.slice.category = c;
    }
    if let Some(d) = parse_set(&s.departments) {
        cfg.slice.departments = Some(d);
    }
    apply_dates(cfg, s.from, s.to);
}

fn apply_dates(cfg: &mut SessionConfig, from: Option<NaiveDate>, to: Option<NaiveDate>) {
    if from.is_none() && to.is_none() {
        return;
    }
    let (cur_from, cur_to) = cfg
        .slice
        .date_range
        .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
    cfg.slice.date_range = Some((from.unwrap_or(cur_from), to.unwrap_or(cur_to)));
}

fn apply_view(cfg: &mut SessionConfig, v: &ViewArgs) {
    if let Some(p) = v.periodicity {
        cfg.periodicity = p;
    }
    if let Some(a) = v.agg_mode {
        cfg.agg_mode = a;
    }
    if let Some(m) = v.metric {
        cfg.metric = m;
    }
    if let Some(view) = v.view {
        cfg.view = view;
    }
}

fn resolve<'a>(
    stores: &'a [StoreRecord],
    cfg: &SessionConfig,
) -> Result<(&'a StoreRecord, BenchmarkGroup)> {
    let Some(key) = cfg.target.as_deref() else {
        bail!("no target store given; pass --target or set `target` in the config");
    };
    let target = benchmark::find_store(stores, key)?;
    let (_, reconciled) = benchmark::cascade(stores, target, cfg.mode, &cfg.filters);
    if reconciled != cfg.filters {
        log::warn!("filter selections outside the offered options were reset to all values");
    }
    let group = benchmark::resolve_benchmark(stores, target, cfg.mode, &reconciled)?;
    Ok((target, group))
}

/// Slices of `rows` shown by the view, in display order.
fn view_slices<'a, T>(view: ViewOption, target: &'a [T], bench: &'a [T]) -> Vec<(&'static str, &'a [T])> {
    let mut out = Vec::new();
    if view.shows_target() {
        out.push(("target", target));
    }
    if view.shows_benchmark() {
        out.push(("benchmark", bench));
    }
    out
}

/// Transaction rows for the session: loaded, sliced, split, plus the calendar.
struct Loaded {
    target: Vec<TransactionRow>,
    bench: Vec<TransactionRow>,
    calendar: PeriodCalendar,
}

fn load_sliced(
    cache: &LoadCache,
    cfg: &SessionConfig,
    target: &StoreRecord,
    group: &BenchmarkGroup,
) -> Result<Loaded> {
    let Some(path) = cfg.transactions.as_ref() else {
        bail!("no transaction file given; pass --transactions or set `transactions` in the config");
    };
    let ids = group.working_ids();
    let rows = cache
        .transactions(path, Some(&ids))
        .with_context(|| format!("loading transactions from {}", path.display()))?;
    let options = slice::department_options(rows.as_slice(), &cfg.slice);
    let filter: SliceFilter = cfg.slice.reconcile(&options);
    if filter.departments != cfg.slice.departments {
        log::warn!("department selection no longer matches the data; using all departments");
    }
    let (_, bench_all) = slice::split_target_benchmark(rows.as_slice(), target.address_id, group);
    let calendar = store_bench::calendar::build_calendar(&slice::clip_to_dates(&bench_all, &filter));
    let sliced = slice::apply_slice(rows.as_slice(), &filter)?;
    let (target_rows, bench_rows) = slice::split_target_benchmark(&sliced, target.address_id, group);
    if cfg.view.shows_benchmark() && bench_rows.is_empty() {
        return Err(BenchError::EmptySelection("no benchmark rows left after slicing".into()).into());
    }
    Ok(Loaded {
        target: target_rows,
        bench: bench_rows,
        calendar,
    })
}

fn save_slices<T: serde::Serialize>(slices: &[(&str, Vec<T>)], output: &OutputArgs) -> Result<()> {
    let Some(path) = output.out.as_ref() else {
        return Ok(());
    };
    let multiple = slices.len() > 1;
    for (name, rows) in slices {
        let p = slice_path(path, name, multiple);
        storage::save_rows(rows, &p, output.format)?;
        eprintln!("Saved {} rows to {}", rows.len(), p.display());
    }
    Ok(())
}

fn cmd_stores(stores: &[StoreRecord], args: StoresArgs) -> Result<()> {
    let shown: Vec<StoreRecord> = match args.store.as_deref() {
        Some(key) => vec![benchmark::find_store(stores, key)?.clone()],
        None => stores.to_vec(),
    };
    for s in &shown {
        println!(
            "{:>8}  {:<28} {:<5} {:<14} {:>8}  {} / {}",
            s.address_id,
            s.store_name,
            s.state,
            s.channel_zone,
            fmt_opt(Some(s.store_size)),
            s.subsidy_program_1,
            s.subsidy_program_2
        );
    }
    if let Some(path) = args.output.out.as_ref() {
        storage::save_rows(&shown, path, args.output.format)?;
        eprintln!("Saved {} rows to {}", shown.len(), path.display());
    }
    Ok(())
}

fn cmd_benchmark(stores: &[StoreRecord], cfg: &SessionConfig, output: OutputArgs) -> Result<()> {
    let (target, group) = resolve(stores, cfg)?;
    println!(
        "Target {} ({}) - {:?} benchmark, {} stores",
        target.address_id,
        target.store_name,
        group.mode,
        group.len()
    );
    let join = |s: &BTreeSet<String>| s.iter().cloned().collect::<Vec<_>>().join(", ");
    println!("  states:            {}", join(&group.criteria.states));
    println!("  channel/zones:     {}", join(&group.criteria.channel_zones));
    println!("  subsidy program 1: {}", join(&group.criteria.subsidy_program_1));
    println!("  subsidy program 2: {}", join(&group.criteria.subsidy_program_2));
    let members: Vec<StoreRecord> = group.member_stores(stores).into_iter().cloned().collect();
    for s in &members {
        println!("  {:>8}  {}", s.address_id, s.store_name);
    }
    if let Some(path) = output.out.as_ref() {
        match output.format.unwrap_or_else(|| OutputFormat::from_path(path)) {
            OutputFormat::Json => storage::save_json(&group, path)?,
            OutputFormat::Csv => storage::save_csv(&members, path)?,
        }
        eprintln!("Saved benchmark group to {}", path.display());
    }
    Ok(())
}

fn cmd_series(stores: &[StoreRecord], cfg: &SessionConfig, args: &SeriesArgs) -> Result<()> {
    let (target, group) = resolve(stores, cfg)?;
    let cache = LoadCache::new();
    let data = load_sliced(&cache, cfg, target, &group)?;
    let tables: Vec<(&str, SeriesTable)> = view_slices(cfg.view, &data.target, &data.bench)
        .into_iter()
        .map(|(name, rows)| {
            let t = compose::compose_series_input(
                rows,
                cfg.metric,
                cfg.periodicity,
                cfg.agg_mode,
                &data.calendar,
            );
            (name, t)
        })
        .collect();

    for (name, t) in &tables {
        println!("[{name}] {} - {} ({})", cfg.metric.label(), cfg.periodicity, cfg.agg_mode.label());
        for r in &t.rows {
            println!(
                "  {:<12} {:>6}  value={}  warehouse={}  promotion={}  gp={}",
                r.period.to_string(),
                r.year,
                fmt_opt(r.value),
                fmt_opt(r.warehouse_ratio),
                fmt_opt(r.promotion_ratio),
                fmt_opt(r.gp_pct)
            );
        }
    }
    let rows: Vec<(&str, Vec<_>)> = tables.iter().map(|(n, t)| (*n, t.rows.clone())).collect();
    save_slices(&rows, &args.output)?;

    if let Some(plot_path) = args.output.plot.as_ref() {
        let refs: Vec<(&str, &SeriesTable)> = tables.iter().map(|(n, t)| (*n, t)).collect();
        let opts = args.output.chart_options();
        match args.chart.trim().to_ascii_lowercase().as_str() {
            "value" => viz::plot_series_table(&refs, &data.calendar, plot_path, &opts)?,
            other => {
                let kind: RatioKind = other.parse().map_err(anyhow::Error::msg)?;
                viz::plot_ratio_table(&refs, &data.calendar, kind, plot_path, &opts)?
            }
        }
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}

fn parse_basket_metric(s: &str) -> Result<BasketMetric> {
    match s.trim().to_ascii_lowercase().as_str() {
        "baskets" | "count" => Ok(BasketMetric::Baskets),
        "size" | "avg-basket-size" => Ok(BasketMetric::AvgBasketSize),
        "value" | "avg-basket-value" => Ok(BasketMetric::AvgBasketValue),
        other => bail!("unknown basket metric: {other}"),
    }
}

fn cmd_baskets(stores: &[StoreRecord], cfg: &SessionConfig, args: &BasketArgs) -> Result<()> {
    let metric = parse_basket_metric(&args.basket_metric)?;
    let (target, group) = resolve(stores, cfg)?;
    let Some(path) = cfg.baskets.as_ref() else {
        bail!("no basket file given; pass --baskets or set `baskets` in the config");
    };
    let cache = LoadCache::new();
    let rows = cache
        .baskets(path, Some(&group.working_ids()))
        .with_context(|| format!("loading baskets from {}", path.display()))?;
    let in_range = slice::clip_to_dates(rows.as_slice(), &cfg.slice);
    let (t_rows, b_rows) = slice::split_target_benchmark(&in_range, target.address_id, &group);
    let calendar = store_bench::calendar::build_calendar(&b_rows);
    let tables: Vec<(&str, Vec<compose::BasketSeriesRow>)> = view_slices(cfg.view, &t_rows, &b_rows)
        .into_iter()
        .map(|(name, rows)| (name, compose::compose_basket_input(rows, cfg.periodicity, &calendar)))
        .collect();

    for (name, t) in &tables {
        println!("[{name}] baskets - {}", cfg.periodicity);
        for r in t {
            println!(
                "  {:<12} {:>6}  baskets={}  size={}  value={}",
                r.period.to_string(),
                r.year,
                fmt_opt(r.store_baskets),
                fmt_opt(r.avg_basket_size),
                fmt_opt(r.avg_basket_value)
            );
        }
    }
    save_slices(&tables, &args.output)?;

    if let Some(plot_path) = args.output.plot.as_ref() {
        let refs: Vec<(&str, &[compose::BasketSeriesRow])> =
            tables.iter().map(|(n, t)| (*n, t.as_slice())).collect();
        viz::plot_basket_table(
            &refs,
            &calendar,
            cfg.periodicity,
            metric,
            plot_path,
            &args.output.chart_options(),
        )?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}

fn cmd_profile(stores: &[StoreRecord], cfg: &SessionConfig, args: &ProfileArgs) -> Result<()> {
    let (target, group) = resolve(stores, cfg)?;
    let cache = LoadCache::new();
    let data = load_sliced(&cache, cfg, target, &group)?;
    let mut tables = Vec::new();
    for (name, rows) in view_slices(cfg.view, &data.target, &data.bench) {
        tables.push((name, compose::compose_synoptic_input(rows, cfg.periodicity, args.dimension)?));
    }
    for (name, t) in &tables {
        println!("[{name}] {} by {}", cfg.metric.label(), args.dimension.column());
        for r in t {
            println!(
                "  {:<12} {:>6}  {:<16} {}  share={}",
                r.period.to_string(),
                r.year,
                r.dimension,
                fmt_opt(Some(r.subtotal(cfg.metric))),
                fmt_opt(r.share(cfg.metric))
            );
        }
    }
    save_slices(&tables, &args.output)?;

    if let Some(plot_path) = args.output.plot.as_ref() {
        let multiple = tables.len() > 1;
        for (name, t) in &tables {
            let p = slice_path(plot_path, name, multiple);
            viz::plot_synoptic(t, cfg.metric, &p, &args.output.chart_options())?;
            eprintln!("Wrote plot to {}", p.display());
        }
    }
    Ok(())
}

fn cmd_index(stores: &[StoreRecord], cfg: &SessionConfig, args: &IndexArgs) -> Result<()> {
    let (target, group) = resolve(stores, cfg)?;
    let cache = LoadCache::new();
    let data = load_sliced(&cache, cfg, target, &group)?;
    let series: Vec<(&str, IndexedSeries)> = view_slices(cfg.view, &data.target, &data.bench)
        .into_iter()
        .map(|(name, rows)| (name, index::index_series(rows, cfg.metric, cfg.agg_mode, args.cumulative)))
        .collect();

    for (name, s) in &series {
        println!("[{name}] {}", s.column_name());
        for p in &s.points {
            let v = p.indexed.map_or_else(|| "NA".to_string(), |v| v.to_string());
            println!("  {}  {}", p.week_end, v);
        }
    }
    let rows: Vec<(&str, Vec<_>)> = series.iter().map(|(n, s)| (*n, s.points.clone())).collect();
    save_slices(&rows, &args.output)?;

    if let Some(plot_path) = args.output.plot.as_ref() {
        let refs: Vec<(&str, &IndexedSeries)> = series.iter().map(|(n, s)| (*n, s)).collect();
        viz::plot_indexed(&refs, plot_path, &args.output.chart_options())?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}

fn cmd_area(stores: &[StoreRecord], cfg: &SessionConfig, args: &AreaArgs) -> Result<()> {
    let (target, group) = resolve(stores, cfg)?;
    let cache = LoadCache::new();
    let data = load_sliced(&cache, cfg, target, &group)?;
    let empty: Vec<TransactionRow> = Vec::new();
    let target_rows = if cfg.view.shows_target() { &data.target } else { &empty };
    let bench_rows = if cfg.view.shows_benchmark() { &data.bench } else { &empty };
    let rows = compose::compose_area_input(target_rows, bench_rows, stores, target.address_id, cfg.metric);

    for r in &rows {
        println!(
            "  {:>8}  {:<28} {:<14} {:>14}  per sqm={}",
            r.address_id,
            r.store_name,
            r.label,
            fmt_opt(Some(r.value)),
            fmt_opt(r.value_per_sqm)
        );
    }
    save_slices(&[("area", rows.clone())], &args.output)?;
    if let Some(plot_path) = args.output.plot.as_ref() {
        viz::plot_area(&rows, cfg.metric, plot_path, &args.output.chart_options())?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }
    Ok(())
}
