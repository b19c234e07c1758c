// src/engine/crawl.rs
// =============================================================================
// The crawl engine owns every shared structure (frontier, visited set,
// termination detector, connection map) and wires them to a pool of worker
// tasks. No globals anywhere: workers get an Arc to this state at spawn time
// and the whole thing is dropped when the run ends.
//
// Lifecycle:
// 1. new()  - validate the configuration, allocate the shared state
// 2. run()  - seed the frontier, spawn W workers, wait for the pool to drain
// 3. the returned CrawlReport is everything the caller learns about the run
//
// Cancellation: a ShutdownSwitch (and the optional deadline) flips the
// detector directly. Workers notice after their current page and exit
// without draining the rest of the frontier.
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::graph::ConnectionMap;
use crate::page::PageFetcher;

use super::frontier::Frontier;
use super::limiter::RateLimiter;
use super::termination::TerminationDetector;
use super::visited::VisitedSet;
use super::worker::run_worker;

// Tuning knobs for one crawl run
pub struct CrawlConfig {
    /// Number of worker tasks (must be at least 1)
    pub workers: usize,
    /// Minimum interval between one worker's network requests
    pub request_delay: Duration,
    /// Stop claiming new pages beyond this bound
    pub max_pages: Option<usize>,
    /// Wall-clock cancellation deadline for the whole run
    pub deadline: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_delay: Duration::from_millis(50),
            max_pages: None,
            deadline: None,
        }
    }
}

// Everything the workers share. Owned exclusively by the engine.
pub(crate) struct CrawlShared {
    pub frontier: Frontier,
    pub visited: VisitedSet,
    pub detector: TerminationDetector,
    pub connections: ConnectionMap,
    pub fetcher: Arc<dyn PageFetcher>,
    pub stats: CrawlStats,
    pub max_pages: Option<usize>,
    pub cancelled: AtomicBool,
}

// Counters the workers bump as they go; folded into the report at the end
pub(crate) struct CrawlStats {
    pub characters_found: AtomicUsize,
    pub pages_skipped: AtomicUsize,
    pub fetch_failures: AtomicUsize,
}

// What one finished run looked like
#[derive(Debug)]
pub struct CrawlReport {
    pub pages_visited: usize,
    pub characters_found: usize,
    pub pages_skipped: usize,
    pub fetch_failures: usize,
    /// Canonical name -> outgoing neighbor names, for every expanded character
    pub connections: std::collections::BTreeMap<String, Vec<String>>,
    /// True when the run was cut short (switch, deadline or page bound)
    /// instead of draining the frontier
    pub cancelled: bool,
}

// External cancellation handle, cheap to clone into a signal handler
#[derive(Clone)]
pub struct ShutdownSwitch {
    shared: Arc<CrawlShared>,
}

impl ShutdownSwitch {
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.detector.trigger_shutdown();
    }
}

pub struct CrawlEngine {
    shared: Arc<CrawlShared>,
    config: CrawlConfig,
}

impl CrawlEngine {
    // The only fatal error in the whole engine: a configuration we cannot
    // start a pool with
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn PageFetcher>) -> anyhow::Result<Self> {
        if config.workers == 0 {
            anyhow::bail!("worker count must be at least 1");
        }

        let shared = Arc::new(CrawlShared {
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            detector: TerminationDetector::new(config.workers),
            connections: ConnectionMap::new(),
            fetcher,
            stats: CrawlStats {
                characters_found: AtomicUsize::new(0),
                pages_skipped: AtomicUsize::new(0),
                fetch_failures: AtomicUsize::new(0),
            },
            max_pages: config.max_pages,
            cancelled: AtomicBool::new(false),
        });

        Ok(Self { shared, config })
    }

    // Hand this to a Ctrl-C handler (or anything else) to stop the run early
    pub fn shutdown_switch(&self) -> ShutdownSwitch {
        ShutdownSwitch {
            shared: Arc::clone(&self.shared),
        }
    }

    // Runs the crawl to completion: seeds the frontier, spawns the pool,
    // and waits for the termination barrier to bring every worker home.
    pub async fn run(self, seed_identifier: String) -> CrawlReport {
        self.shared.frontier.push(seed_identifier);
        self.shared.detector.notify_push();

        if let Some(deadline) = self.config.deadline {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                shared.cancelled.store(true, Ordering::SeqCst);
                shared.detector.trigger_shutdown();
            });
        }

        let handles: Vec<_> = (0..self.config.workers)
            .map(|worker_id| {
                let shared = Arc::clone(&self.shared);
                let limiter = RateLimiter::new(self.config.request_delay);
                tokio::spawn(run_worker(worker_id, shared, limiter))
            })
            .collect();

        for joined in join_all(handles).await {
            if let Err(error) = joined {
                eprintln!("  Warning: worker task failed: {error}");
            }
        }

        CrawlReport {
            pages_visited: self.shared.visited.len(),
            characters_found: self.shared.stats.characters_found.load(Ordering::Relaxed),
            pages_skipped: self.shared.stats.pages_skipped.load(Ordering::Relaxed),
            fetch_failures: self.shared.stats.fetch_failures.load(Ordering::Relaxed),
            connections: self.shared.connections.snapshot(),
            cancelled: self.shared.cancelled.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::name::NameResolver;
    use crate::page::{ContentSource, FetchError, FetchedPage, PageFetcher};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const ORIGIN: &str = "https://wiki.test";

    fn wiki(name: &str) -> String {
        format!("{ORIGIN}/wiki/{name}")
    }

    struct MockPage {
        is_character: bool,
        neighbors: Vec<String>,
    }

    // In-memory fetcher: page "content" is just the canonical name, which
    // lets is_character and extract_neighbors look pages up directly.
    struct MockFetcher {
        resolver: NameResolver,
        pages: HashMap<String, MockPage>,
        fetch_delay: Duration,
        fetches: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new(pages: Vec<(&str, bool, Vec<String>)>) -> Self {
            Self {
                resolver: NameResolver::new(ORIGIN),
                pages: pages
                    .into_iter()
                    .map(|(name, is_character, neighbors)| {
                        (
                            name.to_string(),
                            MockPage {
                                is_character,
                                neighbors,
                            },
                        )
                    })
                    .collect(),
                fetch_delay: Duration::ZERO,
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn with_fetch_delay(mut self, delay: Duration) -> Self {
            self.fetch_delay = delay;
            self
        }

        // How many times each page was actually fetched
        fn fetch_counts(&self) -> HashMap<String, usize> {
            let mut counts = HashMap::new();
            for name in self.fetches.lock().expect("fetch log").iter() {
                *counts.entry(name.clone()).or_insert(0) += 1;
            }
            counts
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        fn resolve_name(&self, identifier: &str) -> Option<String> {
            self.resolver.resolve(identifier)
        }

        fn is_cached(&self, _name: &str) -> bool {
            false
        }

        async fn fetch(&self, name: &str) -> Result<FetchedPage, FetchError> {
            self.fetches
                .lock()
                .expect("fetch log")
                .push(name.to_string());
            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            match self.pages.get(name) {
                Some(_) => Ok(FetchedPage {
                    content: name.to_string(),
                    source: ContentSource::Network,
                }),
                None => Err(FetchError::Status {
                    url: wiki(name),
                    status: 404,
                }),
            }
        }

        fn is_character(&self, content: &str) -> bool {
            self.pages
                .get(content)
                .map_or(false, |page| page.is_character)
        }

        fn extract_neighbors(&self, content: &str) -> HashSet<String> {
            self.pages
                .get(content)
                .map(|page| page.neighbors.iter().cloned().collect())
                .unwrap_or_default()
        }
    }

    // Every test runs under a timeout: a livelocked or deadlocked engine
    // fails loudly instead of hanging the suite
    async fn run_crawl(fetcher: MockFetcher, config: CrawlConfig, seed: &str) -> CrawlReport {
        let fetcher = Arc::new(fetcher);
        let engine = CrawlEngine::new(config, fetcher).expect("engine");
        tokio::time::timeout(Duration::from_secs(10), engine.run(seed.to_string()))
            .await
            .expect("crawl did not terminate")
    }

    fn config(workers: usize) -> CrawlConfig {
        CrawlConfig {
            workers,
            request_delay: Duration::ZERO,
            ..CrawlConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cycle_is_expanded_once_and_terminates() {
        // A <-> B are characters, C is not; the B -> A edge closes a cycle
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("A", true, vec![wiki("B"), wiki("C")]),
            ("B", true, vec![wiki("A"), wiki("C")]),
            ("C", false, vec![wiki("A")]),
        ]));

        let engine = CrawlEngine::new(config(4), fetcher.clone() as Arc<dyn PageFetcher>).expect("engine");
        let report = tokio::time::timeout(Duration::from_secs(10), engine.run(wiki("A")))
            .await
            .expect("crawl did not terminate");

        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.characters_found, 2);
        assert_eq!(report.pages_skipped, 1);
        assert_eq!(report.fetch_failures, 0);
        assert!(!report.cancelled);

        // Despite rediscovery through the cycle, each page was fetched once
        let counts = fetcher.fetch_counts();
        assert_eq!(counts.get("A"), Some(&1));
        assert_eq!(counts.get("B"), Some(&1));
        assert_eq!(counts.get("C"), Some(&1));

        // C was never expanded, so it has no entry in the connection map
        assert!(report.connections.contains_key("A"));
        assert!(report.connections.contains_key("B"));
        assert!(!report.connections.contains_key("C"));
        assert_eq!(report.connections["A"], vec!["B".to_string(), "C".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_workers_never_double_fetch() {
        // A dense triangle: every page pushes every other page, so the same
        // identifiers are pushed and popped concurrently all the time
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("A", true, vec![wiki("B"), wiki("C")]),
            ("B", true, vec![wiki("A"), wiki("C")]),
            ("C", true, vec![wiki("A"), wiki("B")]),
        ]));

        let engine = CrawlEngine::new(config(4), fetcher.clone() as Arc<dyn PageFetcher>).expect("engine");
        let report = tokio::time::timeout(Duration::from_secs(10), engine.run(wiki("A")))
            .await
            .expect("crawl did not terminate");

        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.characters_found, 3);

        for (name, count) in fetcher.fetch_counts() {
            assert_eq!(count, 1, "page {name} was fetched {count} times");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_fetch_stays_claimed_and_is_not_retried() {
        // "Ghost" is linked from two characters but has no page behind it
        let fetcher = Arc::new(MockFetcher::new(vec![
            ("A", true, vec![wiki("B"), wiki("Ghost")]),
            ("B", true, vec![wiki("Ghost")]),
        ]));

        let engine =
            CrawlEngine::new(config(4), fetcher.clone() as Arc<dyn PageFetcher>).expect("engine");
        let report = tokio::time::timeout(Duration::from_secs(10), engine.run(wiki("A")))
            .await
            .expect("crawl did not terminate");

        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.characters_found, 2);
        // The dead link keeps its claim, so it counts as visited...
        assert_eq!(report.pages_visited, 3);
        // ...and the rediscovery through B never reaches the fetcher
        assert_eq!(fetcher.fetch_counts().get("Ghost"), Some(&1));
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn non_page_references_are_discarded_silently() {
        let fetcher = Arc::new(MockFetcher::new(vec![(
            "A",
            true,
            vec![
                "https://elsewhere.example/wiki/B".to_string(),
                format!("{ORIGIN}/wiki/B?action=edit"),
                format!("{ORIGIN}/wiki/Category:Characters"),
                format!("{ORIGIN}/other/B"),
            ],
        )]));

        let engine = CrawlEngine::new(config(2), fetcher.clone() as Arc<dyn PageFetcher>).expect("engine");
        let report = tokio::time::timeout(Duration::from_secs(10), engine.run(wiki("A")))
            .await
            .expect("crawl did not terminate");

        // Only the seed was ever a page reference
        assert_eq!(report.pages_visited, 1);
        assert_eq!(fetcher.fetch_counts().len(), 1);
        assert!(report.connections["A"].is_empty());
    }

    #[tokio::test]
    async fn unresolvable_seed_still_terminates() {
        let fetcher = MockFetcher::new(vec![]);
        let report = run_crawl(fetcher, config(3), "https://wiki.test/wiki/A?x=1").await;

        assert_eq!(report.pages_visited, 0);
        assert_eq!(report.characters_found, 0);
        assert!(!report.cancelled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn max_pages_bounds_the_crawl() {
        // A long chain; only the first two claims may stand
        let fetcher = MockFetcher::new(vec![
            ("A", true, vec![wiki("B")]),
            ("B", true, vec![wiki("C")]),
            ("C", true, vec![wiki("D")]),
            ("D", true, vec![wiki("E")]),
            ("E", true, vec![]),
        ]);

        let report = run_crawl(
            fetcher,
            CrawlConfig {
                workers: 4,
                request_delay: Duration::ZERO,
                max_pages: Some(2),
                deadline: None,
            },
            &wiki("A"),
        )
        .await;

        // The bounded claim admits exactly max_pages names, never more
        assert_eq!(report.pages_visited, 2);
        assert!(report.cancelled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_switch_cancels_without_draining() {
        // A chain long enough that cancellation lands mid-crawl
        let mut pages: Vec<(String, bool, Vec<String>)> = Vec::new();
        for index in 0..50 {
            pages.push((
                format!("P{index}"),
                true,
                vec![wiki(&format!("P{}", index + 1))],
            ));
        }
        let pages: Vec<(&str, bool, Vec<String>)> = pages
            .iter()
            .map(|(name, is_character, neighbors)| {
                (name.as_str(), *is_character, neighbors.clone())
            })
            .collect();

        let fetcher = MockFetcher::new(pages).with_fetch_delay(Duration::from_millis(5));
        let engine = CrawlEngine::new(config(2), Arc::new(fetcher)).expect("engine");
        let switch = engine.shutdown_switch();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            switch.cancel();
        });

        let report = tokio::time::timeout(Duration::from_secs(10), engine.run(wiki("P0")))
            .await
            .expect("cancelled crawl did not terminate");

        assert!(report.cancelled);
        assert!(report.pages_visited < 50);
    }

    #[tokio::test]
    async fn deadline_cancels_a_long_run() {
        let fetcher = MockFetcher::new(vec![
            ("A", true, vec![wiki("B")]),
            ("B", true, vec![wiki("C")]),
            ("C", true, vec![wiki("D")]),
            ("D", true, vec![]),
        ])
        .with_fetch_delay(Duration::from_millis(50));

        let report = run_crawl(
            fetcher,
            CrawlConfig {
                workers: 1,
                request_delay: Duration::ZERO,
                max_pages: None,
                deadline: Some(Duration::from_millis(80)),
            },
            &wiki("A"),
        )
        .await;

        assert!(report.cancelled);
        assert!(report.pages_visited < 4);
    }

    #[test]
    fn zero_workers_is_a_fatal_configuration() {
        let fetcher = Arc::new(MockFetcher::new(vec![]));
        let config = CrawlConfig {
            workers: 0,
            ..CrawlConfig::default()
        };
        assert!(CrawlEngine::new(config, fetcher).is_err());
    }
}
