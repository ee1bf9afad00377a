//! Round-robin endpoint selection.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fairness policy cycling through endpoint indices in fixed order,
/// regardless of individual endpoint health.
///
/// The cursor is owned by one `Forwarder` instance, never process-wide,
/// so independent instances (and tests) do not interfere. Every `next()`
/// call consumes a distinct ordinal before the modulo, so concurrent
/// callers may land on the same index but never observe the same ordinal.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index in `0..len`. `len` must be non-zero (the pool guarantees
    /// it is never constructed empty).
    pub fn next(&self, len: usize) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % len
    }
}
