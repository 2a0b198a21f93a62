//! Blocking Concurrent Queue
//!
//! Multi-producer, multi-consumer FIFO for handing units of work between
//! pipeline threads. Every `write` posts exactly one permit and every `read`
//! consumes one, so writing `None` wakes a blocked reader without data
//! (used to unblock consumers on shutdown).

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// No permit was posted before the deadline
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out waiting for queue item")]
pub struct QueueTimeout;

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    /// Posted but not yet consumed writes (semaphore count)
    permits: usize,
}

/// Blocking FIFO queue
#[derive(Debug)]
pub struct ConcurrentQueue<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
}

impl<T> ConcurrentQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        ConcurrentQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                permits: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue `item` (if any) and wake one reader
    pub fn write(&self, item: Option<T>) {
        let mut state = self.state.lock();
        if let Some(item) = item {
            state.items.push_back(item);
        }
        state.permits += 1;
        drop(state); // Release lock before waking the reader

        self.ready.notify_one();
    }

    /// Block until a write is posted, then pop the front item
    ///
    /// Returns `None` when the permit came from a `write(None)`.
    pub fn read(&self) -> Option<T> {
        let mut state = self.state.lock();
        while state.permits == 0 {
            self.ready.wait(&mut state);
        }
        Self::take(&mut state)
    }

    /// Like [`read`](Self::read) but gives up after `timeout`
    pub fn read_timeout(&self, timeout: Duration) -> Result<Option<T>, QueueTimeout> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.permits == 0 {
            if self.ready.wait_until(&mut state, deadline).timed_out() && state.permits == 0 {
                return Err(QueueTimeout);
            }
        }
        Ok(Self::take(&mut state))
    }

    /// Pop without blocking; `None` if nothing was posted
    pub fn try_read(&self) -> Option<T> {
        let mut state = self.state.lock();
        if state.permits == 0 {
            return None;
        }
        Self::take(&mut state)
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether no items are queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(state: &mut QueueState<T>) -> Option<T> {
        state.permits -= 1;
        state.items.pop_front()
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
