//! Shared work queue of `(url, depth)` items with quiescence detection.
//!
//! Every popped item counts as in flight until `mark_done` is called for it.
//! The queue length and the in-flight count live under one lock, so
//! `wait_quiescent` cannot observe an empty queue while a worker that is
//! still processing an item is about to push the links it found.

use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: String,
    pub depth: usize,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Default)]
struct State {
    queue: VecDeque<FrontierItem>,
    in_flight: usize,
    closed: bool,
}

impl State {
    fn is_quiescent(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }
}

#[derive(Default)]
pub struct Frontier {
    state: Mutex<State>,
    available: Notify,
    quiescent: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an item for exactly one future `pop`.
    ///
    /// # Panics
    /// Pushing into a closed frontier is a bug in the caller.
    pub async fn push(&self, item: FrontierItem) {
        {
            let mut state = self.state.lock().await;
            assert!(!state.closed, "push into closed frontier: {}", item.url);
            debug!("Frontier push {} (depth {})", item.url, item.depth);
            state.queue.push_back(item);
        }
        self.available.notify_one();
    }

    /// Take the next item, waiting while the queue is empty.
    /// Returns `None` once the frontier has been closed.
    pub async fn pop(&self) -> Option<FrontierItem> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a push between the check
            // and the await is not missed.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    state.in_flight += 1;
                    // Another waiter may be able to take the next one.
                    if !state.queue.is_empty() {
                        self.available.notify_one();
                    }
                    return Some(item);
                }
            }

            notified.await;
        }
    }

    /// Record that processing of a popped item finished.
    pub async fn mark_done(&self, item: &FrontierItem) {
        let mut state = self.state.lock().await;
        debug_assert!(state.in_flight > 0, "mark_done without matching pop");
        state.in_flight = state.in_flight.saturating_sub(1);
        debug!("Frontier done {} (in flight: {})", item.url, state.in_flight);
        if state.is_quiescent() {
            self.quiescent.notify_waiters();
        }
    }

    /// Wait until the queue is empty and no popped item is still in flight.
    pub async fn wait_quiescent(&self) {
        loop {
            let notified = self.quiescent.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state.lock().await.is_quiescent() {
                return;
            }

            notified.await;
        }
    }

    /// Stop handing out work. Waiting and future `pop` calls return `None`.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.available.notify_waiters();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.queue.is_empty()
    }

    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight
    }
}
