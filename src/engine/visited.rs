// src/engine/visited.rs
// =============================================================================
// The visited set is the single deduplication authority for the crawl.
//
// The key operation is try_claim(): atomically "check if present, insert if
// not, tell me whether I won". Every correctness guarantee about visiting a
// page exactly once hangs on this one operation being atomic.
//
// Why one lock instead of a separate check and insert?
// - With two steps, two workers can both observe "not claimed" before either
//   inserts, and the page gets fetched twice. HashSet::insert under a single
//   mutex gives us check-and-insert as one indivisible step.
//
// Claims are never given back. A claim that later fails to fetch stays in
// the set so the same dead link can't be re-fetched through a different page
// within the same run.
//
// Rust concepts:
// - HashSet::insert returns bool: true if the value was newly inserted.
//   That's exactly the "first caller wins" answer we need.
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

// What a bounded claim attempt resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller won the claim and should fetch the page
    Claimed,
    /// Someone already holds the claim
    AlreadyClaimed,
    /// The page bound is exhausted; nothing new may be claimed
    LimitReached,
}

// Thread-safe set of canonical page names that have been claimed.
// Grows monotonically for the lifetime of one crawl run.
pub struct VisitedSet {
    names: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            names: Mutex::new(HashSet::new()),
        }
    }

    // Atomically claims a canonical name.
    //
    // Returns true if this caller is the first to claim it (and should go on
    // to fetch and expand the page), false if someone already has it.
    pub fn try_claim(&self, name: &str) -> bool {
        self.names
            .lock()
            .expect("visited mutex poisoned")
            .insert(name.to_string())
    }

    // Like try_claim, but refuses new claims once max_claims names are held.
    // The dedup check runs first: a duplicate of an already-claimed name is
    // AlreadyClaimed even when the set is full.
    pub fn try_claim_bounded(&self, name: &str, max_claims: usize) -> ClaimOutcome {
        let mut names = self.names.lock().expect("visited mutex poisoned");
        if names.contains(name) {
            return ClaimOutcome::AlreadyClaimed;
        }
        if names.len() >= max_claims {
            return ClaimOutcome::LimitReached;
        }
        names.insert(name.to_string());
        ClaimOutcome::Claimed
    }

    pub fn len(&self) -> usize {
        self.names.lock().expect("visited mutex poisoned").len()
    }
}
