use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use gridiron_props::config::{AppConfig, SeasonType, StoreKind, WeekSelector, load_dotenv};
use gridiron_props::export::{
    comparison_workbook_path, export_comparison, export_props, export_stats,
    props_workbook_path, stats_workbook_path,
};
use gridiron_props::logging::{LogConfig, LogFormat, init_logging};
use gridiron_props::model::{PlayerPropRecord, PlayerStatRecord};
use gridiron_props::normalize::{normalize_props, normalize_stats};
use gridiron_props::odds_fetch::{OddsFetchConfig, fetch_all_event_odds};
use gridiron_props::reconcile::{Reconciliation, reconcile};
use gridiron_props::stats_fetch::{StatsFetchConfig, fetch_week_summaries};
use gridiron_props::store::{RecordStore, open_store, write_report_csv};
use gridiron_props::task::{FetchTask, join_both};
use gridiron_props::vocabulary::MARKET_CATEGORIES;

const SHOWN_ERRORS: usize = 6;

#[derive(Parser)]
#[command(
    name = "gridiron-props",
    version,
    about = "Compare NFL player prop lines with the stats players actually recorded"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Record store backend (overrides RECORD_STORE).
    #[arg(long, global = true, value_enum)]
    store: Option<StoreKind>,

    /// Directory for stored records and workbooks (overrides DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch box-score stats for a week, store them and write a workbook.
    Stats(WeekArgs),
    /// Fetch current player props, store them and write a workbook.
    Props(WeekArgs),
    /// Reconcile stored props against stored stats for a week.
    Compare(WeekArgs),
    /// Fetch stats and props concurrently, store both, then reconcile.
    Run(WeekArgs),
    /// List the market keys that resolve to a stat field.
    Markets,
}

#[derive(Args, Clone, Copy)]
struct WeekArgs {
    /// Week number within the season.
    #[arg(long, default_value_t = 1)]
    week: u8,

    /// Season year. Defaults to the current calendar year.
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_enum, default_value = "regular")]
    season_type: SeasonType,
}

impl WeekArgs {
    fn selector(self) -> WeekSelector {
        let base = WeekSelector::current_year_default();
        WeekSelector::new(self.year.unwrap_or(base.year), self.week)
            .with_season_type(self.season_type)
    }
}

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_logging(&LogConfig {
        level: level_for(cli.verbose, cli.quiet),
        format: cli.log_format,
    });

    let mut config = AppConfig::from_env();
    if let Some(store) = cli.store {
        config.store = store;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Command::Markets => {
            print_markets();
            Ok(())
        }
        Command::Stats(args) => cmd_stats(&config, &args.selector()),
        Command::Props(args) => cmd_props(&config, &args.selector()),
        Command::Compare(args) => cmd_compare(&config, &args.selector()),
        Command::Run(args) => cmd_run(&config, &args.selector()),
    }
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn open_configured_store(config: &AppConfig) -> Result<Box<dyn RecordStore>> {
    let store = open_store(config.store, &config.data_dir)?;
    tracing::info!(store = %store.describe(), "record store ready");
    Ok(store)
}

fn cmd_stats(config: &AppConfig, week: &WeekSelector) -> Result<()> {
    let records = fetch_stats(&config.stats, week)?;
    let mut store = open_configured_store(config)?;
    store.save_stats(week, &records)?;
    let summary = export_stats(&stats_workbook_path(&config.data_dir, week), &records)?;
    println!("Stats for {week}: {} player rows", records.len());
    println!("Workbook: {}", summary.path.display());
    Ok(())
}

fn cmd_props(config: &AppConfig, week: &WeekSelector) -> Result<()> {
    let records = fetch_props(&config.odds)?;
    let mut store = open_configured_store(config)?;
    store.save_props(week, &records)?;
    let summary = export_props(&props_workbook_path(&config.data_dir, week), &records)?;
    println!("Props for {week}: {} outcome rows", records.len());
    println!("Workbook: {}", summary.path.display());
    Ok(())
}

fn cmd_compare(config: &AppConfig, week: &WeekSelector) -> Result<()> {
    let store = open_configured_store(config)?;
    let stats = store
        .load_stats(week)
        .with_context(|| format!("no stored stats for {week}; run `stats` first"))?;
    let props = store
        .load_props(week)
        .with_context(|| format!("no stored props for {week}; run `props` first"))?;
    compare_and_report(config, week, &props, &stats)
}

fn cmd_run(config: &AppConfig, week: &WeekSelector) -> Result<()> {
    let stats_cfg = config.stats.clone();
    let odds_cfg = config.odds.clone();
    let selector = *week;
    let stats_task = FetchTask::spawn("stats", move || fetch_stats(&stats_cfg, &selector))?;
    let props_task = FetchTask::spawn("props", move || fetch_props(&odds_cfg))?;

    let (stats, props) = join_both(stats_task, props_task);

    // Whichever side arrived is stored before a failure is reported.
    let mut store = open_configured_store(config)?;
    if let Ok(stats) = &stats {
        store.save_stats(week, stats)?;
    }
    if let Ok(props) = &props {
        store.save_props(week, props)?;
    }
    let (stats, props) = match (stats, props) {
        (Ok(stats), Ok(props)) => (stats, props),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => return Err(err),
        (Err(stats_err), Err(props_err)) => {
            tracing::error!("{props_err:#}");
            return Err(stats_err);
        }
    };
    export_stats(&stats_workbook_path(&config.data_dir, week), &stats)?;
    export_props(&props_workbook_path(&config.data_dir, week), &props)?;
    compare_and_report(config, week, &props, &stats)
}

fn fetch_stats(cfg: &StatsFetchConfig, week: &WeekSelector) -> Result<Vec<PlayerStatRecord>> {
    let summaries = fetch_week_summaries(cfg, week)?;
    if !summaries.errors.is_empty() {
        println!("Stats errors: {}", summaries.errors.len());
        for err in summaries.errors.iter().take(SHOWN_ERRORS) {
            println!("   - {err}");
        }
    }
    if summaries.games.is_empty() {
        return Err(anyhow!("no completed games found for {week}"));
    }
    let normalized = normalize_stats(&summaries.games);
    for diagnostic in summaries.diagnostics.iter().chain(&normalized.diagnostics) {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
    }
    Ok(normalized.records)
}

fn fetch_props(cfg: &OddsFetchConfig) -> Result<Vec<PlayerPropRecord>> {
    let odds = fetch_all_event_odds(cfg)?;
    if !odds.errors.is_empty() {
        println!("Odds errors: {}", odds.errors.len());
        for err in odds.errors.iter().take(SHOWN_ERRORS) {
            println!("   - {err}");
        }
    }
    let normalized = normalize_props(&odds.events);
    for diagnostic in &normalized.diagnostics {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
    }
    Ok(normalized.records)
}

fn compare_and_report(
    config: &AppConfig,
    week: &WeekSelector,
    props: &[PlayerPropRecord],
    stats: &[PlayerStatRecord],
) -> Result<()> {
    let result = reconcile(props, stats);
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("create data dir {}", config.data_dir.display()))?;
    let xlsx_path = comparison_workbook_path(&config.data_dir, week);
    let xlsx = export_comparison(&xlsx_path, &result.report)?;
    let csv_path = xlsx.path.with_extension("csv");
    write_report_csv(&csv_path, &result.report)?;

    print_summary(week, &result);
    println!("Workbook: {}", xlsx.path.display());
    println!("CSV: {}", csv_path.display());
    Ok(())
}

fn print_summary(week: &WeekSelector, result: &Reconciliation) {
    let report = &result.report;
    println!("Props comparison for {week}");
    println!("Classified props: {}", report.outcomes.len());
    for totals in report.totals() {
        println!("  {}", totals.summary());
    }
    println!("  pushes={} no_data={}", report.pushes, report.no_data);
    println!(
        "Skipped: unmapped={} unmatched_players={}",
        result.unmapped, result.unmatched_players
    );

    let breakdown = report.market_breakdown();
    if !breakdown.is_empty() {
        println!("By market:");
        for tally in &breakdown {
            println!(
                "  {:<28} over={:<3} under={:<3} push={:<2} no_data={:<3} {:>6.2}% over",
                tally.market,
                tally.over,
                tally.under,
                tally.push,
                tally.no_data,
                tally.over_fraction() * 100.0
            );
        }
    }

    if !result.diagnostics.is_empty() {
        println!("Diagnostics: {}", result.diagnostics.len());
        for diagnostic in result.diagnostics.iter().take(SHOWN_ERRORS) {
            println!("   - {diagnostic}");
        }
    }
}

fn print_markets() {
    println!("{:<28} {:<10} field", "market", "group");
    for entry in MARKET_CATEGORIES {
        println!("{:<28} {:<10} {}", entry.market, entry.group, entry.label);
    }
}
