use analytics::{AnalyticsError, MetricsReport, StatisticsEngine};
use anyhow::{Context, bail};
use api_client::{PriceCache, YahooClient, load_prices_or_empty, lookback_window};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use configuration::{Config, LogFormat, LoggingConfig};
use core_types::{PriceField, PriceSeries, ReturnSeries};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use reporter::{ReportGenerator, ReportInput, recent_prices_table, summary_table};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// The main entry point for the PriceLens application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config).await,
        Commands::Report(args) => handle_report(args, config).await,
        Commands::Chart(args) => handle_chart(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Fetches daily prices, computes risk/return statistics and renders reports.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statistics of one or more instruments.
    Analyze(AnalyzeArgs),
    /// Write an HTML report with statistics, interpretation and charts.
    Report(OutputArgs),
    /// Write the price and return charts as SVG files.
    Chart(OutputArgs),
}

/// Which instruments and which period to analyze.
#[derive(Args)]
struct SelectionArgs {
    /// The symbols to analyze (e.g., "AAPL", "BTC-USD"). Repeat or space-separate.
    #[arg(long = "symbol", short = 's', required = true, num_args = 1..)]
    symbols: Vec<String>,

    /// Calendar days to look back from today (or from --to).
    #[arg(long, conflicts_with = "from")]
    days: Option<u32>,

    /// The start date (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The end date (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// The price returns are computed from: "close" or "adjusted".
    #[arg(long)]
    price_field: Option<PriceField>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Also list the N most recent quotes of each symbol.
    #[arg(long, value_name = "N")]
    show_prices: Option<usize>,
}

#[derive(Args)]
struct OutputArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Directory to write into. Overrides `report.output_dir`.
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr plus an optional daily rolling file.
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match logging.format {
        LogFormat::Full => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    });

    let mut guard = None;
    if let Some(directory) = &logging.directory {
        let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}

// ==============================================================================
// Shared pipeline
// ==============================================================================

/// One instrument's data and statistics.
struct SymbolAnalysis {
    symbol: String,
    /// The price field the returns were actually computed from.
    field: PriceField,
    prices: PriceSeries,
    returns: ReturnSeries,
    metrics: Result<MetricsReport, AnalyticsError>,
}

/// Resolves the `(start, end)` window from the flags, falling back to the
/// configured lookback.
fn resolve_window(
    selection: &SelectionArgs,
    default_days: u32,
    today: NaiveDate,
) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let end = selection.to.unwrap_or(today);
    let (start, end) = match selection.from {
        Some(from) => (from, end),
        None => lookback_window(selection.days.unwrap_or(default_days), end),
    };
    if start > end {
        bail!("The start date {start} is after the end date {end}");
    }
    Ok((start, end))
}

/// Uppercases the requested symbols and drops blanks and repeats, keeping the
/// first occurrence.
fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Fetches every symbol concurrently and computes its statistics.
async fn run_pipeline(
    selection: &SelectionArgs,
    config: &Config,
) -> anyhow::Result<Vec<SymbolAnalysis>> {
    let today = Local::now().date_naive();
    let (start, end) = resolve_window(selection, config.data.lookback_days, today)?;
    let field = selection.price_field.unwrap_or(config.data.price_field);
    let symbols = normalize_symbols(&selection.symbols);
    if symbols.is_empty() {
        bail!("No symbol given");
    }

    tracing::info!(
        ?symbols,
        %start,
        %end,
        %field,
        "Starting analysis."
    );

    let client = PriceCache::new(YahooClient::new(&config.data)?);

    // Set up the progress bar
    let progress_bar = ProgressBar::new(symbols.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    // Each symbol gets its own future; they share the client and its cache.
    let tasks = symbols.iter().map(|symbol| {
        let client = &client;
        let progress_bar = &progress_bar;
        async move {
            progress_bar.set_message(format!("Fetching {symbol}..."));
            let prices = load_prices_or_empty(client, symbol, start, end).await;
            progress_bar.inc(1);
            prices
        }
    });
    let all_prices = join_all(tasks).await;
    progress_bar.finish_and_clear();

    let engine = StatisticsEngine::new();
    let analyses = symbols
        .into_iter()
        .zip(all_prices)
        .map(|(symbol, prices)| {
            let effective = prices.effective_field(field);
            if effective != field && !prices.is_empty() {
                tracing::warn!(
                    %symbol,
                    "Adjusted close missing for some quotes; using the raw close for the whole series."
                );
            }
            let field = effective;
            let returns = ReturnSeries::from_prices(&prices, field);
            let metrics = engine.compute(&returns);
            SymbolAnalysis {
                symbol,
                field,
                prices,
                returns,
                metrics,
            }
        })
        .collect();

    Ok(analyses)
}

/// Fails the process when not a single symbol produced statistics.
fn ensure_any_succeeded(succeeded: usize) -> anyhow::Result<()> {
    if succeeded == 0 {
        bail!("No symbol could be analyzed");
    }
    Ok(())
}

fn report_failure(analysis: &SymbolAnalysis, error: &AnalyticsError) {
    tracing::error!(symbol = %analysis.symbol, %error, "Skipping symbol.");
    eprintln!("{}: no data to analyze ({error})", analysis.symbol);
}

/// The analyses whose statistics could be computed. Failures are reported and
/// left out, so no chart is drawn for a series the engine rejected.
fn chartable(analyses: &[SymbolAnalysis]) -> Vec<&SymbolAnalysis> {
    analyses
        .iter()
        .filter(|analysis| match &analysis.metrics {
            Ok(_) => true,
            Err(e) => {
                report_failure(analysis, e);
                false
            }
        })
        .collect()
}

// ==============================================================================
// Command handlers
// ==============================================================================

/// Handles the `analyze` command.
async fn handle_analyze(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    let analyses = run_pipeline(&args.selection, &config).await?;

    let mut succeeded = 0;
    let mut json_reports = Vec::new();
    for analysis in &analyses {
        let metrics = match &analysis.metrics {
            Ok(metrics) => metrics,
            Err(e) => {
                report_failure(analysis, e);
                continue;
            }
        };
        succeeded += 1;

        if args.json {
            let mut entry = serde_json::json!({
                "symbol": analysis.symbol,
                "price_field": analysis.field,
                "metrics": metrics,
                "warnings": metrics.warnings().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            if let Some(rows) = args.show_prices {
                entry["recent_prices"] = serde_json::to_value(analysis.prices.tail(rows))?;
            }
            json_reports.push(entry);
        } else {
            println!("{}", summary_table(&analysis.symbol, metrics));
            for warning in metrics.warnings() {
                println!("  note: {warning}");
            }
            if let Some(rows) = args.show_prices {
                println!("{}", recent_prices_table(&analysis.prices, rows));
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_reports)?);
    }

    ensure_any_succeeded(succeeded)
}

/// Handles the `report` command.
async fn handle_report(args: OutputArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(dir) = args.output_dir {
        config.report.output_dir = dir;
    }
    let analyses = run_pipeline(&args.selection, &config).await?;
    let generator = ReportGenerator::new(config.report.clone());
    let generated_at = Local::now().naive_local();

    let mut succeeded = 0;
    for analysis in &analyses {
        let metrics = match &analysis.metrics {
            Ok(metrics) => metrics,
            Err(e) => {
                report_failure(analysis, e);
                continue;
            }
        };

        let path = generator
            .generate(&ReportInput {
                symbol: &analysis.symbol,
                prices: &analysis.prices,
                returns: &analysis.returns,
                metrics,
                price_field: analysis.field,
                generated_at,
            })
            .with_context(|| format!("Failed to write the report for {}", analysis.symbol))?;
        println!("{}: report written to {}", analysis.symbol, path.display());
        succeeded += 1;
    }

    ensure_any_succeeded(succeeded)
}

/// Handles the `chart` command.
async fn handle_chart(args: OutputArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(dir) = args.output_dir {
        config.report.output_dir = dir;
    }
    let analyses = run_pipeline(&args.selection, &config).await?;
    let generator = ReportGenerator::new(config.report.clone());

    let mut succeeded = 0;
    for analysis in chartable(&analyses) {
        let written = generator
            .write_charts(&analysis.prices, &analysis.returns, analysis.field)
            .with_context(|| format!("Failed to write the charts for {}", analysis.symbol))?;
        for path in &written {
            println!("{}: chart written to {}", analysis.symbol, path.display());
        }
        succeeded += 1;
    }

    ensure_any_succeeded(succeeded)
}
