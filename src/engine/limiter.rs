// src/engine/limiter.rs
// =============================================================================
// Polite crawling: each worker paces its own network requests so the wiki
// isn't flooded. With W workers and a delay of D per worker, the aggregate
// request rate stays below W / D.
//
// The limiter is per-worker and owned by the worker (note the &mut self),
// so there is no locking here at all.
//
// Cache hits skip this delay entirely - the worker only calls before_request
// when the fetch is actually going to the network.
// =============================================================================

use std::time::Duration;
use tokio::time::Instant;

// Enforces a minimum interval between one worker's network requests.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    // Sleeps until at least min_interval has passed since this worker's
    // previous network request, then stamps the new request time.
    //
    // Why async sleep? The worker's thread stays free to run other tasks
    // while this one waits - we're throttling the network, not the CPU.
    pub async fn before_request(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
