use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ski_etl::config::Settings;
use ski_etl::diff;
use ski_etl::extractors::FilterConfig;
use ski_etl::models::{ChangeKind, Shop};
use ski_etl::services::ScrapeService;
use ski_etl::storage;
use ski_etl::utils::time::capture_time;

/// `--test` bound on items per shop, matching a single category page.
const TEST_MODE_CAP: usize = 20;

#[derive(Parser)]
#[command(
    name = "ski-etl",
    about = "Scrape Georgian ski storefronts into unified CSV snapshots and diff them."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the selected shops and export a unified snapshot.
    Scrape {
        /// Shops to scrape (xtreme, snowmania, burosports, megasport) or 'all'.
        #[arg(long, num_args = 1.., default_value = "all")]
        shops: Vec<String>,
        /// Test mode: cap the number of items per shop.
        #[arg(long)]
        test: bool,
        /// Minimum price in lari.
        #[arg(long = "min")]
        min_price: Option<f64>,
        /// Maximum price in lari.
        #[arg(long = "max")]
        max_price: Option<f64>,
        /// Output CSV path; defaults to a timestamped file in the export directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare the two most recent snapshots and write a change report.
    Diff {
        /// Directory holding the snapshots; defaults to the configured export directory.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Report path; defaults to skis_diff_<old>_vs_<new>.csv beside the snapshots.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::new().context("loading configuration")?;

    match cli.command {
        Command::Scrape {
            shops,
            test,
            min_price,
            max_price,
            output,
        } => {
            let shops = parse_shops(&shops)?;
            let filters = FilterConfig {
                min_price,
                max_price,
                max_items: test.then_some(TEST_MODE_CAP),
            };
            scrape(settings, &shops, &filters, output).await
        }
        Command::Diff { dir, output } => run_diff(settings, dir, output),
    }
}

fn parse_shops(raw: &[String]) -> Result<Vec<Shop>> {
    let mut shops: Vec<Shop> = Vec::new();
    for entry in raw.iter().flat_map(|s| s.split(',')) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if entry.eq_ignore_ascii_case("all") {
            return Ok(Shop::ALL.to_vec());
        }
        let shop: Shop = entry.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if !shops.contains(&shop) {
            shops.push(shop);
        }
    }
    if shops.is_empty() {
        bail!("no shops selected");
    }
    Ok(shops)
}

async fn scrape(
    settings: Settings,
    shops: &[Shop],
    filters: &FilterConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    let service = ScrapeService::new(settings.clone())?;
    let records = service.run(shops, filters).await?;

    let captured_at = capture_time();
    let dest = match output {
        Some(path) => storage::stamp_output_path(&path, captured_at),
        None => storage::default_snapshot_path(&settings.export.dir, captured_at),
    };

    let bytes = storage::write_snapshot(&records, &dest)
        .with_context(|| format!("exporting snapshot to {}", dest.display()))?;
    info!(
        rows = records.len(),
        bytes,
        dest = %dest.display(),
        "Scrape finished"
    );
    Ok(())
}

fn run_diff(settings: Settings, dir: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or(settings.export.dir);
    let Some((previous, current)) = storage::find_latest_snapshots(&dir)
        .with_context(|| format!("scanning {}", dir.display()))?
    else {
        bail!(
            "need at least two skis_unified_*.csv snapshots in {}",
            dir.display()
        );
    };

    info!(
        previous = %previous.display(),
        current = %current.display(),
        "Comparing snapshots"
    );

    let previous_records = storage::read_snapshot(&previous)?;
    let current_records = storage::read_snapshot(&current)?;
    let entries = diff::diff(&previous_records, &current_records);

    let dest = output.unwrap_or_else(|| diff::report_path(&dir, &previous, &current));
    diff::write_report(&entries, &dest)?;

    let count_of = |kind: ChangeKind| entries.iter().filter(|e| e.kind == kind).count();
    info!(
        sold = count_of(ChangeKind::Sold),
        new_arrivals = count_of(ChangeKind::NewArrival),
        price_changes = count_of(ChangeKind::PriceChanged),
        dest = %dest.display(),
        "Diff finished"
    );
    Ok(())
}
