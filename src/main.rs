use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dairy_stats::catalog::DOWNLOAD_TARGETS;
use dairy_stats::charts::ChartRenderer;
use dairy_stats::config::Config;
use dairy_stats::conversions::fy_label;
use dairy_stats::db::{DbPool, ExportFormat, GroupCount, ObservationFilter, ObservationRepository};
use dairy_stats::fetcher::SourceDownloader;
use dairy_stats::observation::PeriodKind;
use dairy_stats::services::IngestService;

#[derive(Parser)]
#[command(name = "dairy-stats")]
#[command(about = "Build a harmonised database of Australian dairy statistics", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env)]
    database_url: Option<String>,

    /// Root directory for raw, processed and final data
    #[arg(long, env)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the source workbooks
    Download {
        /// Re-download files that already exist
        #[arg(long)]
        force: bool,

        /// Also list agricultural dataflows from the ABS data API
        #[arg(long)]
        probe_api: bool,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that work against the observation store
#[derive(Subcommand)]
enum StoreCommand {
    /// Create the schema and seed regions and variables
    InitDb,
    /// Extract every source workbook into the store
    Ingest,
    /// Write the flat export
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (default: <data-dir>/final/aus_dairy_stats.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print observation counts by category, variable, region and confidence
    Summary,
    /// Render the paper's figures as SVG
    Charts {
        #[arg(long, env = "FIGURE_DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Print one variable's series
    Query {
        #[arg(long)]
        variable: String,

        /// Region code (default: AUS)
        #[arg(long, default_value = "AUS")]
        region: String,

        #[arg(long)]
        from: Option<i32>,

        #[arg(long)]
        to: Option<i32>,
    },
}

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dairy_stats=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    info!("Loaded configuration: {:?}", config);

    match cli.command {
        Command::Download { force, probe_api } => download(&config, force, probe_api).await,
        Command::Store(command) => {
            let db = DbPool::connect(&config.database_url).await?;
            let result = run_store_command(&config, &db, command).await;
            db.close().await;
            result
        }
    }
}

async fn run_store_command(
    config: &Config,
    db: &DbPool,
    command: StoreCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        StoreCommand::InitDb => {
            db.init_store().await?;
            println!("Database ready at {}", config.database_url);
        }
        StoreCommand::Ingest => ingest(config, db).await?,
        StoreCommand::Export { format, output } => {
            let path = output.unwrap_or_else(|| match format {
                ExportFormat::Csv => config.export_path(),
                ExportFormat::Json => config.export_path().with_extension("json"),
            });
            let rows = ObservationRepository::new(db.pool().clone())
                .export(format, &path)
                .await?;
            println!("Exported {rows} observations to {}", path.display());
        }
        StoreCommand::Summary => summary(db).await?,
        StoreCommand::Charts { output_dir } => {
            let dir = output_dir.unwrap_or_else(|| config.figure_dir.clone());
            let report = ChartRenderer::new(db.pool().clone(), &dir).render_all().await?;
            println!("\n{}", "=".repeat(60));
            println!("Figures");
            println!("{}", "=".repeat(60));
            for path in &report.rendered {
                println!("  {}", path.display());
            }
            for (name, reason) in &report.skipped {
                println!("  skipped {name}: {reason}");
            }
            println!("{}", "=".repeat(60));
        }
        StoreCommand::Query {
            variable,
            region,
            from,
            to,
        } => {
            let filter = ObservationFilter::variable(&variable)
                .region(&region)
                .years(from, to);
            let observations = ObservationRepository::new(db.pool().clone())
                .query(&filter)
                .await?;
            if observations.is_empty() {
                println!("No observations for {variable} in {region}");
            }
            for o in observations {
                let period = match o.period_kind {
                    PeriodKind::FiscalYear => fy_label(o.year),
                    PeriodKind::CalendarYear => o.year.to_string(),
                };
                println!(
                    "{:<10} {:>16} {:<8} {}",
                    period,
                    o.value,
                    o.confidence.as_str(),
                    o.original_unit.as_deref().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

async fn download(
    config: &Config,
    force: bool,
    probe_api: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let downloader = SourceDownloader::from_config(config)?;
    let raw_dir = config.raw_dir();

    let pb = spinner("Downloading source workbooks...");
    let report = downloader
        .download_all(DOWNLOAD_TARGETS, &raw_dir, force)
        .await;
    pb.finish_with_message(format!(
        "✓ {} downloaded, {} already present",
        report.downloaded.len(),
        report.skipped.len()
    ));

    println!("\n{}", "=".repeat(60));
    println!("Download Summary");
    println!("{}", "=".repeat(60));
    println!("Targets:            {}", report.total());
    println!("Downloaded:         {}", report.downloaded.len());
    println!("Already present:    {}", report.skipped.len());
    println!("Failed:             {}", report.failed.len());
    for (name, error) in &report.failed {
        println!("  {name}: {error}");
    }
    println!("{}", "=".repeat(60));

    if probe_api {
        match downloader.probe_abs_dataflows().await {
            Ok(flows) => {
                println!("\nABS agricultural dataflows: {}", flows.len());
                for flow in flows {
                    println!("  {:<24} {}", flow.id, flow.name.unwrap_or_default());
                }
            }
            Err(e) => warn!(error = %e, "ABS API probe failed"),
        }
    }

    Ok(())
}

async fn ingest(config: &Config, db: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let pb = spinner("Ingesting source workbooks...");

    let report = IngestService::new(db.clone())
        .with_processed_dir(config.processed_dir())
        .run(&config.raw_dir())
        .await?;
    pb.finish_with_message(format!("✓ Stored {} observations", report.written()));

    let total = ObservationRepository::new(db.pool().clone()).count().await?;

    println!("\n{}", "=".repeat(60));
    println!("Ingest Summary");
    println!("{}", "=".repeat(60));
    for source in &report.sources {
        println!("{}", source.source);
        if let Some(reason) = &source.skipped {
            println!("  skipped: {reason}");
            continue;
        }
        println!("  Extracted:        {}", source.extracted);
        println!("  Dropped (empty):  {}", source.dropped);
        println!("  Written:          {}", source.written);
        println!("  Failed:           {}", source.failed);
        for failure in &source.table_failures {
            println!("  {}: {}", failure.table, failure.error);
        }
    }
    println!("{}", "-".repeat(60));
    println!("Observations in store: {total}");
    println!("Total Time:            {:.2}s", start.elapsed().as_secs_f64());
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn summary(db: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = ObservationRepository::new(db.pool().clone())
        .summary()
        .await?;

    println!("\n{}", "=".repeat(60));
    println!("Database Summary: {} observations", summary.total);
    println!("{}", "=".repeat(60));
    print_groups("By category", &summary.by_category);
    print_groups("By variable", &summary.by_variable);
    print_groups("By region", &summary.by_region);
    print_groups("By confidence", &summary.by_confidence);
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_groups(title: &str, groups: &[GroupCount]) {
    println!("\n{title}:");
    for group in groups {
        let span = match (group.min_year, group.max_year) {
            (Some(min), Some(max)) => format!("{min}-{max}"),
            _ => String::new(),
        };
        println!("  {:<32} {:>6}  {}", group.key, group.count, span);
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_is_not_a_store_command() {
        let cli = Cli::try_parse_from(["dairy-stats", "download", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Download {
                force: true,
                probe_api: false
            }
        ));

        let cli = Cli::try_parse_from(["dairy-stats", "init-db"]).unwrap();
        assert!(matches!(cli.command, Command::Store(StoreCommand::InitDb)));

        let cli = Cli::try_parse_from(["dairy-stats", "query", "--variable", "herd_dairy_cows"]).unwrap();
        match cli.command {
            Command::Store(StoreCommand::Query { variable, region, .. }) => {
                assert_eq!(variable, "herd_dairy_cows");
                assert_eq!(region, "AUS");
            }
            _ => panic!("Expected a query command"),
        }
    }
}
