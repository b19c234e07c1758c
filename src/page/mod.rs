// src/page/mod.rs
// =============================================================================
// This module is the "page fetcher" side of the crawler: everything that
// knows about URLs, HTML, the on-disk cache, and what makes a page a
// character page.
//
// Submodules:
// - name: validates identifiers and resolves them to canonical page names
// - cache: one-file-per-page HTML cache
// - fetcher: the real implementation (reqwest + scraper) of PageFetcher
//
// The crawl engine only talks to the PageFetcher trait defined here. That
// keeps the engine's concurrency logic testable against an in-memory fake,
// with no network anywhere near the tests.
// =============================================================================

mod cache;
mod fetcher;
pub(crate) mod name;

pub use fetcher::WikiFetcher;

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

// Where a page's content came from. Cache hits skip the politeness delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Cache,
    Network,
}

// A fetched page body plus where it came from. Ephemeral - nothing here is
// persisted beyond the cache file the fetcher may have written.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content: String,
    pub source: ContentSource,
}

// Typed fetch failures, so the worker (and the tests) can tell a transport
// problem from a bad status code instead of parsing log text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("request for {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("request for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

// Both answers the engine needs about one page's content, produced from a
// single inspection pass.
#[derive(Debug)]
pub struct PageFacts {
    pub is_character: bool,
    pub neighbors: HashSet<String>,
}

// The collaborator contract the crawl engine is built against.
//
// resolve_name returning None means "not a page reference at all" - that is
// an expected, high-frequency outcome (external links, category pages, edit
// links), not an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Derives the canonical page name from a raw identifier, or None if the
    /// identifier doesn't match the wiki's page-reference pattern.
    fn resolve_name(&self, identifier: &str) -> Option<String>;

    /// True if the page is already cache-resident, meaning a fetch will not
    /// touch the network (and needs no throttling).
    fn is_cached(&self, name: &str) -> bool;

    /// Returns the page content, cache-first with network fallback.
    async fn fetch(&self, name: &str) -> Result<FetchedPage, FetchError>;

    /// The domain predicate: is this a character page?
    fn is_character(&self, content: &str) -> bool;

    /// Extracts the set of neighbor identifiers linked from the content.
    fn extract_neighbors(&self, content: &str) -> HashSet<String>;

    /// Classification and extraction in one call. Implementations that parse
    /// the content should override this so the parse happens only once.
    fn inspect(&self, content: &str) -> PageFacts {
        PageFacts {
            is_character: self.is_character(content),
            neighbors: self.extract_neighbors(content),
        }
    }
}
