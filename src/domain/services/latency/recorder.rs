//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Append-only latency sample store owned by the matching task. One entry per completed order
// whose stamps are causal; the three sample sequences always have the same length.
// It is moved out of the matching thread at join time, so it is never read concurrently.
//--------------------------------------------------------------------------------------------------

use crate::domain::models::types::OrderTimestamps;
use crate::domain::services::latency::stats::{LatencyReport, LatencyStats};

/// Nanosecond latency samples in arrival order.
#[derive(Debug, Clone, Default)]
pub struct LatencyRecorder {
    /// processed - produce
    end_to_end_ns: Vec<u64>,
    /// consume - produce
    queue_wait_ns: Vec<u64>,
    /// processed - consume
    service_ns: Vec<u64>,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the sample buffers to avoid regrowth during a run.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            end_to_end_ns: Vec::with_capacity(capacity),
            queue_wait_ns: Vec::with_capacity(capacity),
            service_ns: Vec::with_capacity(capacity),
        }
    }

    /// Appends the samples derived from a fully processed order. Either all three sequences grow
    /// by one or none of them does.
    ///
    /// # Returns
    /// * `Some(ns)` - The end-to-end latency that was recorded
    /// * `None` - The order is missing a stamp or its stamps are not causal; nothing is recorded
    pub fn record(&mut self, timestamps: &OrderTimestamps) -> Option<u64> {
        if !timestamps.is_causal() {
            return None;
        }
        let end_to_end = timestamps.end_to_end()?;
        let queue_wait = timestamps.queue_wait()?;
        let service = timestamps.service_time()?;

        let end_to_end_ns = saturating_nanos(end_to_end.as_nanos());
        self.end_to_end_ns.push(end_to_end_ns);
        self.queue_wait_ns.push(saturating_nanos(queue_wait.as_nanos()));
        self.service_ns.push(saturating_nanos(service.as_nanos()));
        Some(end_to_end_ns)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end_to_end_ns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end_to_end_ns.is_empty()
    }

    /// End-to-end samples in the order they were recorded.
    pub fn end_to_end_samples(&self) -> &[u64] {
        &self.end_to_end_ns
    }

    /// Consumes the recorder and computes statistics for every sample sequence.
    pub fn into_report(self) -> LatencyReport {
        LatencyReport {
            end_to_end: LatencyStats::from_samples(self.end_to_end_ns),
            queue_wait: LatencyStats::from_samples(self.queue_wait_ns),
            service: LatencyStats::from_samples(self.service_ns),
        }
    }
}

#[inline]
fn saturating_nanos(nanos: u128) -> u64 {
    u64::try_from(nanos).unwrap_or(u64::MAX)
}
