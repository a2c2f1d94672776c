use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use homewatch_core::llm::error::LlmDiagnosticsError;
use homewatch_core::market::RegionMetric;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analyze;
mod chart;
mod sync;
mod zip_history;

const DEFAULT_CHART_DAYS: i64 = 730;
const DEFAULT_ZIP_HISTORY_SINCE: &str = "2024-01-01";

#[derive(Debug, Parser)]
#[command(name = "homewatch_worker")]
struct Args {
    /// Do everything except writing to the database.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Weekly refresh of indicators, news and the metro median price.
    Sync,

    /// Refresh inventory and days on market for one tracked zip code.
    Zip {
        #[arg(long)]
        zip: String,
    },

    /// Print stored inventory / days-on-market history for tracked zip codes.
    ZipHistory {
        /// Only this zip code; otherwise every tracked one.
        #[arg(long)]
        zip: Option<String>,

        #[arg(long, value_parser = parse_date, default_value = DEFAULT_ZIP_HISTORY_SINCE)]
        since: NaiveDate,
    },

    /// Generate and store a narrative analysis for a region.
    Analyze {
        #[arg(long, default_value = "Las Vegas")]
        region: String,
    },

    /// Fill missing score / timing columns by parsing stored analyses again.
    Reparse {
        /// Only this analysis; otherwise every analysis with a missing column.
        #[arg(long)]
        id: Option<i64>,
    },

    /// Print stored analyses, newest first.
    History {
        #[arg(long)]
        region: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Print a date-aligned table of Zillow metrics across all tracked regions.
    Chart {
        /// zhvi, zori, new-listings, sales-count, price-cuts or forecast. Repeat (or separate
        /// with commas) to put several metrics in one table.
        #[arg(long = "metric", required = true, value_delimiter = ',', value_parser = parse_region_metric)]
        metrics: Vec<RegionMetric>,

        /// First date (YYYY-MM-DD). Defaults to two years back.
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,
    },

    /// Print each region's price-cut share on the sample nearest to a date.
    PriceCuts {
        #[arg(long, value_parser = parse_date, default_value = "2024-12-25")]
        target: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = homewatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let today = chrono::Utc::now().date_naive();
    let dry_run = args.dry_run;

    let result = match args.command {
        Command::Sync => sync::run_sync(&settings, today, dry_run).await,
        Command::Zip { zip } => sync::run_zip(&settings, &zip, today, dry_run).await,
        Command::ZipHistory { zip, since } => {
            zip_history::run_zip_history(&settings, zip.as_deref(), since).await
        }
        Command::Analyze { region } => analyze::run_analyze(&settings, &region, dry_run).await,
        Command::Reparse { id } => analyze::run_reparse(&settings, id, dry_run).await,
        Command::History { region, limit } => {
            analyze::run_history(&settings, region.as_deref(), limit).await
        }
        Command::Chart { metrics, since } => {
            let since = since.unwrap_or(today - chrono::Duration::days(DEFAULT_CHART_DAYS));
            chart::run_chart(&settings, &metrics, since, today).await
        }
        Command::PriceCuts { target } => chart::run_price_cuts(&settings, target).await,
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
            tracing::error!(
                provider = diag.provider.as_str(),
                stage = diag.stage,
                raw_output_len = diag.raw_output.as_deref().map_or(0, str::len),
                "LLM diagnostics"
            );
        }
        tracing::error!(error = %format!("{err:#}"), dry_run, "worker command failed");
    }
    result
}

fn init_sentry(settings: &homewatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}"))
}

fn parse_region_metric(s: &str) -> Result<RegionMetric, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
        .map_err(|_| format!("unknown metric {s:?}"))
}
