// src/engine/mod.rs
// =============================================================================
// The concurrent traversal engine. This is the heart of the crawler.
//
// Submodules:
// - frontier: shared FIFO of pending page identifiers
// - visited: atomic claim-once set of canonical names
// - termination: idle-counting barrier that decides when the run is over
// - limiter: per-worker politeness delay
// - worker: the acquire/resolve/claim/fetch/classify/expand loop
// - crawl: the CrawlEngine that owns and wires all of the above
//
// The engine never parses HTML or touches the network itself; all of that
// lives behind the PageFetcher trait in the page module.
// =============================================================================

mod crawl;
mod frontier;
mod limiter;
mod termination;
mod visited;
mod worker;

// Re-export only what main.rs drives; the submodules stay internal
pub use crawl::{CrawlConfig, CrawlEngine, CrawlReport};
