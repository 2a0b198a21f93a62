//! Lock-free snapshot of the latest average speed
//!
//! The estimator itself is single-threaded. A gauge lets the owning thread
//! publish each new average so that monitor threads can read it without a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, cloneable cell holding the latest published speed
#[derive(Debug, Clone, Default)]
pub struct SpeedGauge {
    /// `f64` bit pattern; all-zero bits read back as 0.0
    bits: Arc<AtomicU64>,
}

impl SpeedGauge {
    /// Create a gauge reading 0.0
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new value (release semantics for visibility to readers)
    pub fn publish(&self, speed: f64) {
        self.bits.store(speed.to_bits(), Ordering::Release);
    }

    /// Read the latest published value
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_value_is_zero() {
        assert_eq!(SpeedGauge::new().load(), 0.0);
    }

    #[test]
    fn test_clones_share_the_cell() {
        let gauge = SpeedGauge::new();
        let reader = gauge.clone();

        gauge.publish(48_000.5);
        assert_eq!(reader.load(), 48_000.5);

        let handle = std::thread::spawn(move || reader.load());
        assert_eq!(handle.join().unwrap(), 48_000.5);
    }
}
