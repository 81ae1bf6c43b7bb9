//! Emergency stop flag
//!
//! The only state shared between interrupt context and the main cycle.
//! The interrupt handler is the single writer that sets the flag; the main
//! cycle reads it and clears it once a full stop has been acknowledged.
//!
//! Ordering: `signal` stores the flag with `Release` and readers load it
//! with `Acquire`, so once the main cycle observes the flag it also observes
//! the debounce timestamp written before it. Only plain loads and stores are
//! used, which keeps the flag lock-free on cores without compare-and-swap.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Default minimum interval between accepted stop edges
pub const DEFAULT_STOP_DEBOUNCE_MS: u32 = 50;

/// Debounced, interrupt-safe stop request flag
#[derive(Debug)]
pub struct StopFlag {
    /// Stop requested and not yet acknowledged
    engaged: AtomicBool,
    /// At least one edge has been accepted
    seen_edge: AtomicBool,
    /// Timestamp of the last accepted edge (ms)
    last_edge_ms: AtomicU32,
    /// Minimum re-trigger interval (ms)
    debounce_ms: u32,
}

impl StopFlag {
    /// Create a new, disengaged flag
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            engaged: AtomicBool::new(false),
            seen_edge: AtomicBool::new(false),
            last_edge_ms: AtomicU32::new(0),
            debounce_ms,
        }
    }

    /// Record a stop edge (interrupt context)
    ///
    /// Returns `false` if the edge arrived within the debounce interval of
    /// the previous accepted edge and was ignored.
    pub fn signal(&self, now_ms: u32) -> bool {
        if self.seen_edge.load(Ordering::Relaxed) {
            let last = self.last_edge_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < self.debounce_ms {
                return false;
            }
        }

        self.last_edge_ms.store(now_ms, Ordering::Relaxed);
        self.seen_edge.store(true, Ordering::Relaxed);
        self.engaged.store(true, Ordering::Release);
        true
    }

    /// Check if a stop has been requested
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    /// Acknowledge the stop (main cycle only, after a full stop)
    pub fn clear(&self) {
        self.engaged.store(false, Ordering::Release);
    }

    /// Configured debounce interval
    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_DEBOUNCE_MS)
    }
}
