//! The crawl frontier: deduplicating FIFO queue plus in-flight accounting
//!
//! The frontier owns the only shared mutable state of a crawl:
//! - the pending queue of URLs still to fetch (first discovered, first fetched)
//! - the set of every URL ever accepted
//! - the number of URLs handed to workers whose processing has not finished
//! - the termination flag
//!
//! All four live behind one mutex, so "is it new / add it" and "is anything
//! queued or in flight" are always answered against one consistent view.
//! Waiters are woken through a single [`Notify`].

use std::collections::{HashSet, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Outcome of [`Frontier::dequeue`]
#[derive(Debug)]
pub enum Dequeued {
    /// A URL to process; the frontier counts it as in flight until dropped
    Work(WorkItem),

    /// The frontier was terminated; the caller should exit
    Terminated,
}

/// A URL handed out by the frontier
///
/// While a `WorkItem` is alive its URL counts as outstanding work, which
/// keeps the crawl from being considered finished. Dropping it marks the
/// work complete, so links discovered while processing must be enqueued
/// before the item is dropped.
#[derive(Debug)]
pub struct WorkItem {
    url: String,
    frontier: Frontier,
}

impl WorkItem {
    /// The URL to process
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for WorkItem {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

/// Point-in-time counters of a frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrontierSnapshot {
    /// URLs waiting in the pending queue
    pub pending: usize,

    /// URLs handed out and not yet completed
    pub in_flight: usize,

    /// URLs ever accepted
    pub seen: usize,

    /// Whether termination was requested
    pub terminated: bool,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<String>,
    seen: HashSet<String>,
    in_flight: usize,
    terminated: bool,
}

impl State {
    fn is_quiescent(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    changed: Notify,
}

/// Shared, internally synchronized crawl frontier
///
/// Cloning a `Frontier` yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    shared: Arc<Shared>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a URL to the frontier
    ///
    /// Returns `true` if the URL was never seen before, in which case it is
    /// recorded and appended to the pending queue. Returns `false` for
    /// duplicates, leaving the frontier unchanged. The membership check and
    /// the insertion happen under one lock.
    pub fn enqueue(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        {
            let mut state = self.lock();
            if state.seen.contains(&url) {
                return false;
            }
            state.seen.insert(url.clone());
            state.pending.push_back(url);
        }
        self.shared.changed.notify_waiters();
        true
    }

    /// Takes the next pending URL, waiting while the queue is empty
    ///
    /// Returns [`Dequeued::Terminated`] once [`terminate`](Self::terminate)
    /// has been called, even if URLs are still pending.
    pub async fn dequeue(&self) -> Dequeued {
        loop {
            let mut notified = self.subscribe();
            {
                let mut state = self.lock();
                if state.terminated {
                    return Dequeued::Terminated;
                }
                if let Some(url) = state.pending.pop_front() {
                    state.in_flight += 1;
                    return Dequeued::Work(WorkItem {
                        url,
                        frontier: self.clone(),
                    });
                }
            }
            notified.as_mut().await;
        }
    }

    /// Returns true if no URL is pending; a snapshot only
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Waits until nothing is pending and nothing is in flight, or until the
    /// frontier is terminated
    ///
    /// Returns `true` on quiescence and `false` on termination.
    pub async fn wait_quiescent(&self) -> bool {
        loop {
            let mut notified = self.subscribe();
            {
                let state = self.lock();
                if state.terminated {
                    return false;
                }
                if state.is_quiescent() {
                    return true;
                }
            }
            notified.as_mut().await;
        }
    }

    /// Terminates the frontier, waking every waiter
    ///
    /// Subsequent and currently blocked calls to `dequeue` return
    /// `Terminated`. Work items already handed out stay valid and are still
    /// accounted for when dropped.
    pub fn terminate(&self) {
        self.lock().terminated = true;
        self.shared.changed.notify_waiters();
    }

    /// Returns true once [`terminate`](Self::terminate) was called
    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// Returns the current counters
    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        FrontierSnapshot {
            pending: state.pending.len(),
            in_flight: state.in_flight,
            seen: state.seen.len(),
            terminated: state.terminated,
        }
    }

    fn complete(&self) {
        let quiescent = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.is_quiescent()
        };
        if quiescent {
            self.shared.changed.notify_waiters();
        }
    }

    /// Registers interest in the next state change before the state is
    /// inspected, so a change between inspection and waiting is not lost
    fn subscribe(&self) -> Pin<Box<Notified<'_>>> {
        let mut notified = Box::pin(self.shared.changed.notified());
        notified.as_mut().enable();
        notified
    }

    // Every operation leaves the state consistent before releasing the
    // lock, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
