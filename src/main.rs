//! Main entry point for ryt-cipher CLI

use anyhow::Context;
use clap::Parser;
use ryt_cipher::cli::{Args, OutputFormatter, ScriptLocation};
use ryt_cipher::core::SignatureResolver;
use ryt_cipher::platform::{HttpScriptFetcher, RawFormat, ResolvedFormat, ScriptSource};
use ryt_cipher::platform::cipher::ExtractedAlgorithm;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_filter());
    debug!("Starting ryt-cipher with args: {:?}", args);

    let formatter = OutputFormatter::new(args.verbosity_level(), args.pretty);
    if let Err(e) = run(&args, &formatter).await {
        formatter.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(args: &Args, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let location = args.script_location()?;
    let formats = args.read_formats().context("failed to load formats")?;
    let fetcher = HttpScriptFetcher::with_config(args.http_config())?;
    let resolver = SignatureResolver::new(fetcher);

    let formats = match formats {
        Some(formats) if !args.print_algorithm => formats,
        _ => {
            let algorithm = load_algorithm(&resolver, &location).await?;
            formatter.print_algorithm_summary(&algorithm);
            formatter.print_algorithm(&algorithm)?;
            return Ok(());
        }
    };

    let resolved = resolve(&resolver, &location, &formats).await?;
    formatter.print_formats(&resolved)?;
    formatter.print_summary(&resolved, start_time.elapsed());
    Ok(())
}

async fn load_algorithm(
    resolver: &SignatureResolver<HttpScriptFetcher>,
    location: &ScriptLocation,
) -> anyhow::Result<Arc<ExtractedAlgorithm>> {
    let algorithm = match location {
        ScriptLocation::File(path) => {
            let source = read_script(path)?;
            resolver.algorithm_for_source(&source).await?
        }
        ScriptLocation::Remote(url) => resolver.algorithm_for(url).await?,
        ScriptLocation::Page(page) => {
            let url = resolver.discover_script_url(page).await?;
            info!("Discovered player script {}", url);
            resolver.algorithm_for(&url).await?
        }
    };
    Ok(algorithm)
}

async fn resolve(
    resolver: &SignatureResolver<HttpScriptFetcher>,
    location: &ScriptLocation,
    formats: &[RawFormat],
) -> anyhow::Result<Vec<ResolvedFormat>> {
    let resolved = match location {
        ScriptLocation::File(path) => {
            let source = read_script(path)?;
            resolver.resolve_with_source(&source, formats).await?
        }
        ScriptLocation::Remote(url) => resolver.resolve(url, formats).await?,
        ScriptLocation::Page(page) => {
            let url = resolver.discover_script_url(page).await?;
            info!("Discovered player script {}", url);
            resolver.resolve(&url, formats).await?
        }
    };
    Ok(resolved)
}

fn read_script(path: &Path) -> anyhow::Result<ScriptSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read player script {}", path.display()))?;
    Ok(ScriptSource::new(path.display().to_string(), text))
}

/// Initialize logging system
fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
