//! Command-line front end: load a URL list, extract fields, write the results

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use extractly::{
    ExtractionPipeline, FieldSet, OutputFormat, ResultSerializer,
    input::{DEFAULT_URL_COLUMN, load_urls},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "extractly")]
#[command(about = "Extract titles, content text and meta tags from a list of web pages")]
#[command(version)]
struct Cli {
    /// Text file with one URL per line, or a CSV/XLSX file with a URL column
    #[arg(short, long)]
    input: PathBuf,

    /// Fields to extract (comma-separated): `title`, tag names, or attribute="value" meta tokens
    #[arg(short, long, default_value = "title,h1,h2,h3,p")]
    fields: String,

    /// Meta tags to extract (comma-separated attribute="value" pairs)
    ///
    /// Meta tags already listed in `--fields` are extracted once.
    #[arg(short, long, default_value = "name=\"description\"")]
    meta: String,

    /// Output format: csv, json or xlsx
    #[arg(long, default_value = "csv")]
    format: OutputFormat,

    /// Where to write the results (default: results.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the CSV/XLSX column containing URLs
    #[arg(long, default_value = DEFAULT_URL_COLUMN)]
    url_column: String,

    /// Number of URLs fetched at the same time
    #[arg(short, long, default_value_t = 1)]
    concurrency: usize,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Validate fields before any network activity
    let fields: FieldSet = cli.fields.parse().context("Invalid --fields")?;
    let fields = if cli.meta.trim().is_empty() {
        fields
    } else {
        let meta: FieldSet = cli.meta.parse().context("Invalid --meta")?;
        fields.union(meta).context("Invalid field selection")?
    };

    let urls = load_urls(&cli.input, &cli.url_column)
        .with_context(|| format!("Failed to load URLs from {}", cli.input.display()))?;

    let mut builder = ExtractionPipeline::builder()
        .concurrency(cli.concurrency)
        .on_progress(|event| {
            info!("Processing batch {} of {}...", event.completed, event.total);
        });
    if let Some(secs) = cli.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    let pipeline = builder.build().context("Invalid pipeline configuration")?;

    let cancel_token = CancellationToken::new();
    let token_clone = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, finishing the current URL");
            token_clone.cancel();
        }
    });

    let result = pipeline
        .run_with_cancellation(&urls, &fields, cancel_token)
        .await?;

    if result.is_cancelled() {
        warn!(
            "Batch processing stopped after {} of {} URLs",
            result.len(),
            result.total()
        );
    } else {
        info!(
            failed = result.failed_count(),
            "Batch processing complete: {} URLs",
            result.len()
        );
    }

    let payload = ResultSerializer::serialize(&result, cli.format)?;
    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(cli.format.file_name()));
    std::fs::write(&output, payload)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        path = %output.display(),
        mime_type = cli.format.mime_type(),
        "Results written"
    );
    Ok(())
}
