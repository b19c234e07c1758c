// src/engine/frontier.rs
// =============================================================================
// The frontier is the shared queue of page identifiers waiting to be crawled.
//
// Design decisions:
// - FIFO order: pages discovered earlier are (roughly) crawled earlier
// - Duplicates are allowed on push! Deduplication happens at claim time in
//   the VisitedSet, not here. This keeps pushes cheap and leaves a single
//   source of truth for "already processed".
// - pop() is non-blocking. Workers that find the frontier empty park on the
//   termination detector instead of spinning here.
//
// Rust concepts:
// - Mutex: Wraps the queue so many workers can share it safely
// - VecDeque: Double-ended queue, perfect for FIFO (push_back / pop_front)
// =============================================================================

use std::collections::VecDeque;
use std::sync::Mutex;

// Thread-safe FIFO of pending page identifiers.
//
// All mutation happens inside a single mutex region, so a push and a pop
// can never partially interleave.
pub struct Frontier {
    queue: Mutex<VecDeque<String>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    // Appends an identifier unconditionally (duplicates are fine here)
    pub fn push(&self, identifier: String) {
        self.queue
            .lock()
            .expect("frontier mutex poisoned")
            .push_back(identifier);
    }

    // Removes and returns the oldest identifier, or None if the queue is empty
    pub fn pop(&self) -> Option<String> {
        self.queue
            .lock()
            .expect("frontier mutex poisoned")
            .pop_front()
    }

    // Diagnostics only! The size can be stale the moment we return it,
    // so never base a correctness decision on this number.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("frontier mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is VecDeque?
//    - A double-ended queue (deck)
//    - push_back() adds to end, pop_front() removes from start
//    - Perfect for FIFO work queues
//
// 2. What is Mutex<T> in Rust?
//    - Unlike most languages, the mutex OWNS the data it protects
//    - You cannot touch the VecDeque without locking first; the compiler
//      enforces it
//    - lock() returns a guard; the lock is released when the guard drops
//      (at the end of the expression here, so the critical sections are tiny)
//
// 3. Why &self and not &mut self on push()?
//    - The Mutex provides "interior mutability": shared references are
//      enough, which is what lets many workers hold the same &Frontier
// -----------------------------------------------------------------------------
