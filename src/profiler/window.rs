//! Fixed ring of finished bucket speeds
//!
//! Keeps a running sum next to the ring so the average is updated in O(1)
//! on every insert: cumulative mean while filling, sliding mean once full.

use crate::{ProfilerError, Result};

/// Ring of finished bucket speeds with an incrementally maintained sum
///
/// Storage is reserved once in [`SpeedWindow::new`]; [`push`](Self::push)
/// never allocates and never rescans the ring.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    /// Bucket values, `len()` is the ring length
    buckets: Vec<f64>,
    /// Slot holding the oldest bucket once the ring is full
    oldest: usize,
    /// Buckets finished so far, saturating at the ring length
    completed: usize,
    /// Sum of all valid slots
    running_sum: f64,
}

impl SpeedWindow {
    /// Create a ring holding `ring_length` buckets
    ///
    /// # Errors
    ///
    /// Returns an error if `ring_length` is 0 or the storage can't be reserved.
    pub fn new(ring_length: usize) -> Result<Self> {
        if ring_length == 0 {
            return Err(ProfilerError::InvalidConfig("ring length is zero".into()));
        }

        let mut buckets = Vec::new();
        buckets.try_reserve_exact(ring_length).map_err(|e| {
            ProfilerError::Allocation(format!("can't allocate {ring_length} buckets: {e}"))
        })?;
        buckets.resize(ring_length, 0.0);

        Ok(SpeedWindow {
            buckets,
            oldest: 0,
            completed: 0,
            running_sum: 0.0,
        })
    }

    /// Insert a finished bucket and return the new moving average
    pub fn push(&mut self, value: f64) -> f64 {
        let len = self.buckets.len();

        if self.completed < len {
            // Still filling: slots are used in order, so the next one is `completed`
            self.buckets[self.completed] = value;
            self.running_sum += value;
            self.completed += 1;
            self.running_sum / self.completed as f64
        } else {
            let evicted = std::mem::replace(&mut self.buckets[self.oldest], value);
            self.running_sum += value - evicted;
            self.oldest = (self.oldest + 1) % len;
            self.running_sum / len as f64
        }
    }

    /// Number of buckets the ring holds
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false; a window has at least one slot
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets finished so far (saturates at [`len`](Self::len))
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Whether the sliding-mean phase has been reached
    pub fn is_full(&self) -> bool {
        self.completed == self.buckets.len()
    }

    /// Sum of the buckets currently in the window
    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    /// Drop all buckets, keeping the storage
    pub fn clear(&mut self) {
        self.buckets.fill(0.0);
        self.oldest = 0;
        self.completed = 0;
        self.running_sum = 0.0;
    }
}
