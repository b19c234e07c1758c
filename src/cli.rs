// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The crawler is a single-run batch tool, so there are no subcommands:
// one seed URL in, one crawl out.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "character-atlas",
    version,
    about = "Crawls a wiki from a seed page and maps its graph of character pages",
    long_about = "character-atlas starts from a seed wiki page, follows links between pages, \
                  keeps only the pages classified as characters, and writes the resulting \
                  connection graph as JSON. Pages are cached on disk so re-runs are cheap."
)]
pub struct Cli {
    /// Seed page URL (e.g. https://warriors.fandom.com/wiki/Squirrelstar)
    ///
    /// This is a positional argument (required, no flag needed)
    pub seed_url: String,

    /// Number of concurrent crawl workers
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Minimum delay in milliseconds between one worker's network requests
    ///
    /// Cache hits are free; this only paces real downloads
    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    /// Stop after this many pages have been claimed
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Cancel the run after this many seconds, even if pages remain
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Directory for the on-disk page cache
    #[arg(long, value_name = "DIR", default_value = ".cache")]
    pub cache_dir: PathBuf,

    /// Where to write the connection map
    #[arg(long, value_name = "FILE", default_value = "connections.json")]
    pub output: PathBuf,

    /// Print the run summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
