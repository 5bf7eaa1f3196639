//! bundle-cli - Bundle Image Creator
//!
//! Command-line caller around `bundle-core`: feeds a bundle CSV export
//! through the pipeline and writes the image archive plus the bundle
//! manifest and missing-images reports, or downloads a single product
//! image for preview.

use anyhow::{bail, Context, Result};
use bundle_core::pipeline::ProgressEvent;
use bundle_core::{archive, catalog, report};
use bundle_core::{normalize_code, BundlePipeline, HttpImageSource, ImageSource};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::{FileConfig, RunOverrides};

/// Command-line arguments for bundle-cli
#[derive(Parser, Debug)]
#[command(name = "bundle-cli")]
#[command(about = "Create product bundle images from a bundle CSV export")]
#[command(version)]
struct Cli {
    /// Optional TOML config file with defaults for the flags below
    #[arg(long, global = true, env = "BUNDLE_CONFIG_FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a bundle CSV into images, reports and a ZIP archive
    Run(RunArgs),
    /// Download a single product image (preview helper)
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Bundle CSV (`;`-delimited, columns sku and pzns_in_set)
    input: PathBuf,

    /// Output directory for the archive and reports
    #[arg(short, long, default_value = "bundle_output", env = "BUNDLE_OUTPUT_DIR")]
    output: PathBuf,

    /// Tiling layout: horizontal, vertical or automatic
    #[arg(long, env = "BUNDLE_LAYOUT")]
    layout: Option<String>,

    /// Regional fallback tried when p1/p10 miss: none, fr, de, nl or be
    #[arg(long, env = "BUNDLE_FALLBACK")]
    fallback: Option<String>,

    /// Trim reference color: white or corner-pixel
    #[arg(long, env = "BUNDLE_TRIM_MODE")]
    trim_mode: Option<String>,

    /// Blank constituent codes: skip or record-miss
    #[arg(long, env = "BUNDLE_BLANK_CODES")]
    blank_codes: Option<String>,

    /// Image store host
    #[arg(long, env = "BUNDLE_IMAGE_HOST")]
    image_host: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "BUNDLE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Emit progress as NDJSON on stdout instead of log lines
    #[arg(long)]
    progress_json: bool,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Product code to preview
    code: String,

    /// Image suffix, 1 through 18
    #[arg(long, default_value = "1")]
    suffix: String,

    /// Directory the image is written to
    #[arg(short, long, default_value = ".", env = "BUNDLE_OUTPUT_DIR")]
    output: PathBuf,

    /// Image store host
    #[arg(long, env = "BUNDLE_IMAGE_HOST")]
    image_host: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "BUNDLE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bundle_core=info,bundle_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let file_config = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => run(args, file_config).await,
        Command::Fetch(args) => fetch(args, file_config).await,
    }
}

async fn run(args: RunArgs, file_config: FileConfig) -> Result<()> {
    let run_config = config::resolve_run_config(
        RunOverrides {
            layout: args.layout.as_deref(),
            fallback: args.fallback.as_deref(),
            trim_mode: args.trim_mode.as_deref(),
            blank_codes: args.blank_codes.as_deref(),
            image_host: args.image_host.as_deref(),
            timeout_secs: args.timeout_secs,
        },
        &file_config,
    )?;

    info!(input = %args.input.display(), "Loading bundle catalog");
    let rows = catalog::parse_catalog_file(&args.input)
        .context("Failed to load bundle catalog")?;
    info!(rows = rows.len(), "Catalog loaded");

    let source = HttpImageSource::new(&run_config.resolver)?;

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let progress_json = args.progress_json;
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if progress_json {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{}", line);
                }
            } else if let ProgressEvent::RowCompleted {
                rows_done,
                rows_total,
                ref sku,
                ..
            } = event
            {
                info!(sku = %sku, "Processed {}/{} bundles", rows_done, rows_total);
            }
        }
    });

    let pipeline = BundlePipeline::with_events(run_config, source, event_tx);
    let output = pipeline.run(&rows).await;
    // Close the progress channel so the printer task drains and exits.
    drop(pipeline);
    printer.await?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {}", args.output.display()))?;

    let archive_path = args.output.join(archive::ARCHIVE_FILENAME);
    std::fs::write(&archive_path, archive::build_archive(&output.entries)?)?;
    let manifest_path = args.output.join(report::MANIFEST_FILENAME);
    std::fs::write(&manifest_path, report::manifest_csv(&output.manifest)?)?;
    let missing_path = args.output.join(report::MISSING_FILENAME);
    std::fs::write(&missing_path, report::missing_csv(&output.missing)?)?;

    info!(
        run_id = %output.run_id,
        archive = %archive_path.display(),
        files = output.summary.produced_files,
        cross_country = output.summary.cross_country_bundles,
        "Processing complete"
    );
    if output.summary.missing_codes > 0 {
        warn!(
            missing = output.summary.missing_codes,
            report = %missing_path.display(),
            "Some images were not found"
        );
    }

    Ok(())
}

async fn fetch(args: FetchArgs, file_config: FileConfig) -> Result<()> {
    let suffix: u8 = match args.suffix.trim().parse() {
        Ok(n) if (1..=18).contains(&n) => n,
        _ => bail!("suffix must be a number between 1 and 18"),
    };

    let resolver_config = config::resolve_resolver_config(
        args.image_host.as_deref(),
        args.timeout_secs,
        &file_config,
    );
    let source = HttpImageSource::new(&resolver_config)?;

    let normalized = normalize_code(&args.code);
    match source.fetch(&normalized, &suffix.to_string()).await {
        Some(bytes) => {
            std::fs::create_dir_all(&args.output).with_context(|| {
                format!("Failed to create output directory: {}", args.output.display())
            })?;
            let path = args.output.join(format!("{}-p{}.jpg", args.code, suffix));
            std::fs::write(&path, bytes)?;
            info!(path = %path.display(), "Image saved");
            Ok(())
        }
        None => bail!("No image found for {} with -p{}.jpg", args.code, suffix),
    }
}
