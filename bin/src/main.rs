//! CLI for the fundamentals ledger and summary report.
//!
//! `precompute` rebuilds the long ledger from the per-year source extracts,
//! `report` derives the wide summary report from an existing ledger, and
//! `run` does both.

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use fundamentals::{EngineConfig, FiscalYear, LongTableBuilder, Result, SummaryReportGenerator};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fundamentals")]
#[command(about = "Fundamentals ledger and per-stock valuation summary", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug)]
struct PathArgs {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the per-year source extracts
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,
    /// Close-price listing
    #[arg(long, global = true)]
    price_file: Option<PathBuf>,
    /// Ledger artifact
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,
    /// Update manifest
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    /// Report CSV destination
    #[arg(long, global = true)]
    report_csv: Option<PathBuf>,
    /// Report JSON destination
    #[arg(long, global = true)]
    report_json: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the long ledger and its update manifest
    Precompute {
        /// Fiscal years to include (default: every year with an income statement)
        #[arg(long, value_delimiter = ',')]
        years: Vec<FiscalYear>,
    },
    /// Generate the summary report from the existing ledger
    Report(ReportArgs),
    /// Precompute the ledger, then generate the summary report
    Run {
        /// Fiscal years for the ledger (default: every year with an income statement)
        #[arg(long, value_delimiter = ',')]
        ledger_years: Vec<FiscalYear>,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// List fiscal years that have an income-statement extract
    Years,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Fiscal years to report, any order (default: current year plus the trailing window)
    #[arg(long, value_delimiter = ',', conflicts_with = "summary_years")]
    years: Vec<FiscalYear>,
    /// Trailing years covered when `--years` is not given
    #[arg(long)]
    summary_years: Option<usize>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!(error = %e, "run failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.paths)?;

    match cli.command {
        Commands::Precompute { years } => precompute(&config, &years),
        Commands::Report(args) => report(&config, &args),
        Commands::Run { ledger_years, report: args } => {
            precompute(&config, &ledger_years)?;
            report(&config, &args)
        }
        Commands::Years => {
            for year in LongTableBuilder::new(&config).discover_years()? {
                println!("{year}");
            }
            Ok(())
        }
    }
}

/// Configuration file (or defaults) with command-line overrides applied.
fn load_config(paths: &PathArgs) -> Result<EngineConfig> {
    let mut config = match &paths.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    override_path(&mut config.source_dir, paths.source_dir.as_ref());
    override_path(&mut config.price_file, paths.price_file.as_ref());
    override_path(&mut config.ledger_file, paths.ledger.as_ref());
    override_path(&mut config.manifest_file, paths.manifest.as_ref());
    override_path(&mut config.report_csv, paths.report_csv.as_ref());
    override_path(&mut config.report_json, paths.report_json.as_ref());
    Ok(config)
}

fn override_path(target: &mut PathBuf, value: Option<&PathBuf>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn precompute(config: &EngineConfig, years: &[FiscalYear]) -> Result<()> {
    let years = (!years.is_empty()).then_some(years);
    let manifest = LongTableBuilder::new(config).precompute(
        years,
        &config.ledger_file,
        &config.manifest_file,
    )?;

    println!("Ledger written to {}", config.ledger_file.display());
    println!("  Records:    {}", manifest.total_records);
    println!("  Securities: {}", manifest.unique_stocks);
    println!("  Years:      {}", manifest.year_range);
    println!("  Duration:   {:.2}s", manifest.duration_seconds);
    Ok(())
}

fn report(config: &EngineConfig, args: &ReportArgs) -> Result<()> {
    let years = report_years(config, args);
    info!(?years, "generating summary report");

    let report = SummaryReportGenerator::new(config).run(&years)?;

    println!("Summary report: {} securities, {} columns", report.height(), report.width());
    println!("  CSV:  {}", config.report_csv.display());
    println!("  JSON: {}", config.report_json.display());
    Ok(())
}

/// Years requested on the command line, or the configured trailing window
/// ending at the current fiscal year.
fn report_years(config: &EngineConfig, args: &ReportArgs) -> Vec<FiscalYear> {
    if !args.years.is_empty() {
        return args.years.clone();
    }
    let mut config = config.clone();
    if let Some(summary_years) = args.summary_years {
        config.summary_years = summary_years;
    }
    config.report_years(Local::now().date_naive())
}
