//! pidify - resolve draft DMP metadata to persistent identifiers
//!
//! Thin CLI around the resolution engine: reads a DraftRecord as JSON,
//! runs one resolution, prints the PIDified record as JSON on stdout.
//! Logs go to stderr so stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::Parser;
use pidify_common::ResolverConfig;
use pidify_resolver::{DraftRecord, ResolutionOrchestrator};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "pidify",
    version,
    about = "Resolve draft DMP metadata to ORCID, ROR, and CrossRef identifiers"
)]
struct Args {
    /// Draft record JSON file produced by the extraction step
    #[arg(short, long)]
    input: PathBuf,

    /// Resolver configuration TOML (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pidify {}", env!("CARGO_PKG_VERSION"));

    let config = ResolverConfig::load(args.config.as_deref()).context("loading configuration")?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading draft record {}", args.input.display()))?;
    let draft: DraftRecord = serde_json::from_str(&raw).context("parsing draft record")?;

    let orchestrator =
        ResolutionOrchestrator::new(config).context("initializing registry clients")?;
    let record = orchestrator.resolve(&draft).await;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
