use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// State shared by every task of one run: the run signal and the order id counter.
///
/// Passed to tasks behind an `Arc`. Cancellation is cooperative: tasks poll `is_running` between
/// operations and finish the one in progress before exiting.
#[derive(Debug)]
pub struct RunContext {
    running: AtomicBool,
    next_order_id: AtomicU64,
}

impl RunContext {
    /// Creates a context with the run signal raised and ids starting at zero.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            next_order_id: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Drops the run signal. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Hands out a process-unique order id. Relaxed: only uniqueness matters, not the order in
    /// which other threads observe increments.
    #[inline]
    pub fn next_order_id(&self) -> u64 {
        self.next_order_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn ids_issued(&self) -> u64 {
        self.next_order_id.load(Ordering::Relaxed)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
