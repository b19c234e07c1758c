// src/engine/worker.rs
// =============================================================================
// The per-worker loop. Each iteration is a small state machine:
//
// 1. Acquire  - pop an identifier, or park until work arrives / shutdown
// 2. Resolve  - identifier -> canonical name; not a page reference? discard
// 3. Claim    - atomic first-claimer-wins on the visited set (this is also
//               where the optional page bound is enforced)
// 4. Throttle - politeness delay, skipped when the page is cache-resident
// 5. Fetch    - cache-first, network fallback
// 6. Classify - non-characters stay claimed (no re-fetch) but don't expand
// 7. Expand   - push every neighbor back onto the frontier
//
// Every per-page error is handled right here and the loop continues; nothing
// a single page does can take down the pool.
//
// Ordering subtlety in acquire(): the wake-on-push future must be registered
// BEFORE the final "is the frontier empty" check. Otherwise a push landing
// in that gap would neither be popped nor wake us, and the crawl could hang
// or terminate early.
// =============================================================================

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::crawl::CrawlShared;
use super::limiter::RateLimiter;
use super::visited::ClaimOutcome;
use crate::page::ContentSource;

pub(crate) async fn run_worker(
    worker_id: usize,
    shared: Arc<CrawlShared>,
    mut limiter: RateLimiter,
) {
    loop {
        let Some(identifier) = acquire(&shared).await else {
            break;
        };
        process(worker_id, &shared, &mut limiter, identifier).await;
    }
}

// Pops the next identifier, parking while the frontier is empty.
// Returns None exactly once, when the run is over (barrier or cancellation).
async fn acquire(shared: &CrawlShared) -> Option<String> {
    loop {
        if shared.detector.is_shutdown() {
            return None;
        }
        if let Some(identifier) = shared.frontier.pop() {
            return Some(identifier);
        }

        // Register for wake-on-push before the last emptiness check
        let wake = shared.detector.work_signal();
        tokio::pin!(wake);
        wake.as_mut().enable();

        // A push may have landed while we were registering
        if let Some(identifier) = shared.frontier.pop() {
            return Some(identifier);
        }

        // We are idle. If every worker is idle and the frontier is still
        // empty, nobody can ever produce work again: fire the barrier.
        // (Only an active worker can push, so idle == pool size means the
        // frontier cannot grow under us.)
        let idle = shared.detector.enter_idle();
        if idle == shared.detector.pool_size() && shared.frontier.is_empty() {
            shared.detector.trigger_shutdown();
            return None;
        }

        tokio::select! {
            _ = &mut wake => {
                shared.detector.leave_idle();
                // Loop back and race for the new work
            }
            _ = shared.detector.wait_for_shutdown() => {
                return None;
            }
        }
    }
}

// Steps 2-7 for a single popped identifier.
async fn process(
    worker_id: usize,
    shared: &CrawlShared,
    limiter: &mut RateLimiter,
    identifier: String,
) {
    // Resolve: silently discard anything that isn't a page reference.
    // This case never touches the visited set.
    let Some(name) = shared.fetcher.resolve_name(&identifier) else {
        return;
    };

    // Claim. With a page bound, the dedup check and the limit check are one
    // atomic step in the visited set; the claim that would cross the bound
    // is refused and the whole pool is told to stop.
    match shared.max_pages {
        None => {
            if !shared.visited.try_claim(&name) {
                return;
            }
        }
        Some(max_pages) => match shared.visited.try_claim_bounded(&name, max_pages) {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::AlreadyClaimed => return,
            ClaimOutcome::LimitReached => {
                shared.cancelled.store(true, Ordering::SeqCst);
                shared.detector.trigger_shutdown();
                return;
            }
        },
    }

    // Throttle only requests that will actually hit the network
    if !shared.fetcher.is_cached(&name) {
        limiter.before_request().await;
    }

    let page = match shared.fetcher.fetch(&name).await {
        Ok(page) => page,
        Err(error) => {
            // Per-page failure: warn and move on. The claim stays, so the
            // same dead link reached again through another page is not
            // re-fetched within this run.
            eprintln!("  Warning: {error}");
            shared.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    // One parse of the content answers both questions
    let facts = shared.fetcher.inspect(&page.content);

    if !facts.is_character {
        // Stays claimed so nobody fetches it again, but is not expanded
        println!("  [worker {worker_id}] Not a character, skipping: {name}");
        shared.stats.pages_skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let origin = match page.source {
        ContentSource::Cache => "cache",
        ContentSource::Network => "network",
    };
    println!("  [worker {worker_id}] Expanding character ({origin}): {name}");
    shared.stats.characters_found.fetch_add(1, Ordering::Relaxed);

    // Record the character's outgoing edges under canonical names
    let mut neighbor_names: Vec<String> = facts
        .neighbors
        .iter()
        .filter_map(|neighbor| shared.fetcher.resolve_name(neighbor))
        .collect();
    neighbor_names.sort();
    shared.connections.record(&name, neighbor_names);

    // Expand: push unconditionally, claim happens when each one is popped.
    // Every push wakes a parked worker if there is one.
    for neighbor in facts.neighbors {
        shared.frontier.push(neighbor);
        shared.detector.notify_push();
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is tokio::select!?
//    - Waits on several futures at once and runs the branch of whichever
//      finishes first
//    - Here: "either new work arrives, or shutdown is announced"
//    - The other future is dropped, which safely cancels it
//
// 2. What is tokio::pin!?
//    - Some futures (like Notified) must be pinned in place before they can
//      be polled by reference
//    - pin! turns a future on the stack into a Pin<&mut ...> we can both
//      enable() and later await
//
// 3. What is 'let Some(x) = ... else'?
//    - let-else: destructure or bail out of the surrounding block
//    - Reads nicer than a match when the None arm is just "give up"
//
// 4. Why claim BEFORE fetching?
//    - The fetch is the expensive part (network!)
//    - Claiming first means two workers holding the same identifier settle
//      ownership in one cheap atomic step, and only the winner pays for
//      the download
// -----------------------------------------------------------------------------
