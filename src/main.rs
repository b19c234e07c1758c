// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the page fetcher (HTTP client + cache) and the crawl engine
// 3. Run the crawl to completion (or until cancelled)
// 4. Write the connection map and print a summary
// 5. Exit with proper code (0 = crawl finished, 2 = could not start)
//
// Note the exit code policy: a page that fails to download is NOT an error
// for the process. Only being unable to start at all (bad seed, unusable
// cache directory, zero workers) is fatal.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod engine; // src/engine/ - the concurrent traversal engine
mod graph; // src/graph.rs - connection map + JSON export
mod page; // src/page/ - page fetching, caching and classification

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use url::Url;

use cli::Cli;
use engine::{CrawlConfig, CrawlEngine, CrawlReport};
use page::{PageFetcher, WikiFetcher};

// The #[tokio::main] attribute transforms our async main into a real main
// function by creating a tokio runtime and running our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Startup failed - print the error chain and exit with code 2
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let seed = Url::parse(&cli.seed_url)
        .with_context(|| format!("invalid seed URL '{}'", cli.seed_url))?;

    let fetcher = Arc::new(WikiFetcher::new(&seed, &cli.cache_dir)?);

    // The seed must itself be a page reference; otherwise the crawl would
    // silently visit nothing
    if fetcher.resolve_name(seed.as_str()).is_none() {
        anyhow::bail!(
            "seed URL '{}' is not a wiki page reference (expected .../wiki/<PageName>)",
            cli.seed_url
        );
    }

    println!("🔍 Crawling {} with {} worker(s)", cli.seed_url, cli.workers);

    let config = CrawlConfig {
        workers: cli.workers,
        request_delay: Duration::from_millis(cli.delay_ms),
        max_pages: cli.max_pages,
        deadline: cli.deadline_secs.map(Duration::from_secs),
    };
    let engine = CrawlEngine::new(config, fetcher)?;

    // Ctrl-C stops the workers after their current page instead of
    // draining the rest of the frontier
    let switch = engine.shutdown_switch();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping workers...");
            switch.cancel();
        }
    });

    let report = engine.run(seed.to_string()).await;

    graph::export_connections(&cli.output, &report.connections)?;

    if cli.json {
        print_json_summary(&cli, &report)?;
    } else {
        print_summary(&cli, &report);
    }

    Ok(0)
}

// Machine-readable run summary for --json
#[derive(Serialize)]
struct RunSummary<'a> {
    seed: &'a str,
    pages_visited: usize,
    characters_found: usize,
    pages_skipped: usize,
    fetch_failures: usize,
    cancelled: bool,
    output: String,
}

fn print_json_summary(cli: &Cli, report: &CrawlReport) -> Result<()> {
    let summary = RunSummary {
        seed: &cli.seed_url,
        pages_visited: report.pages_visited,
        characters_found: report.characters_found,
        pages_skipped: report.pages_skipped,
        fetch_failures: report.fetch_failures,
        cancelled: report.cancelled,
        output: cli.output.display().to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// Prints a human-readable summary of the run
fn print_summary(cli: &Cli, report: &CrawlReport) {
    println!();
    println!("📊 Summary:");
    println!("   📄 Pages visited: {}", report.pages_visited);
    println!("   🐾 Characters found: {}", report.characters_found);
    println!("   ⏭️  Skipped (not characters): {}", report.pages_skipped);
    println!("   ⚠️  Fetch failures: {}", report.fetch_failures);

    if report.cancelled {
        println!("   🛑 Run was cancelled before the frontier drained");
    } else {
        println!("   ✅ Frontier fully explored");
    }

    println!("💾 Connection map written to {}", cli.output.display());
}
