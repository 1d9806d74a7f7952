use std::time::Instant;

/// Source of monotonic instants for order lifecycle stamping.
///
/// The pipeline calls `now` exactly three times per order: once in the generator and twice in
/// the matching task.
pub trait Clock: Send + Sync {
    /// Get the current instant according to this clock
    fn now(&self) -> Instant;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}

/// The process monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn name(&self) -> &str {
        "MonotonicClock"
    }
}
