//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Post-run latency statistics. Samples are sorted once, then count, mean, min, max and the
// nearest-rank percentiles p50/p90/p99 are read off the sorted sequence.
//
// | Component        | Description                                                      |
// |------------------|------------------------------------------------------------------|
// | LatencyStats     | Summary of one sample sequence, in nanoseconds                   |
// | LatencyReport    | End-to-end stats plus queue-wait and service breakdowns          |
//
// Percentile index is floor(count * p), clamped to the last element. No interpolation.
//--------------------------------------------------------------------------------------------------

use std::fmt;
use serde::{Serialize, Deserialize};

/// Nearest-rank index for a percentile given in basis points (5000 = p50).
#[inline]
pub fn percentile_index(count: usize, basis_points: u32) -> usize {
    debug_assert!(count > 0);
    let raw = (count as u128 * basis_points as u128 / 10_000) as usize;
    raw.min(count - 1)
}

/// Summary statistics over one latency sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean_ns: f64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
}

impl LatencyStats {
    /// Sorts `samples` ascending and computes the summary.
    ///
    /// # Returns
    /// * `Some(LatencyStats)` - When at least one sample is present
    /// * `None` - When `samples` is empty
    pub fn from_samples(mut samples: Vec<u64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();

        let count = samples.len();
        let sum: u128 = samples.iter().map(|&s| s as u128).sum();

        Some(Self {
            count,
            mean_ns: sum as f64 / count as f64,
            min_ns: samples[0],
            max_ns: samples[count - 1],
            p50_ns: samples[percentile_index(count, 5_000)],
            p90_ns: samples[percentile_index(count, 9_000)],
            p99_ns: samples[percentile_index(count, 9_900)],
        })
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        writeln!(f, "--- {title} ---")?;
        writeln!(f, "Total Orders: {}", self.count)?;
        writeln!(f, "Mean:         {:.2} us", self.mean_ns / 1_000.0)?;
        writeln!(f, "Min:          {:.2} us", micros(self.min_ns))?;
        writeln!(f, "Median (p50): {:.2} us", micros(self.p50_ns))?;
        writeln!(f, "p90:          {:.2} us", micros(self.p90_ns))?;
        writeln!(f, "p99:          {:.2} us", micros(self.p99_ns))?;
        write!(f, "Max:          {:.2} us", micros(self.max_ns))
    }
}

#[inline]
fn micros(nanos: u64) -> f64 {
    nanos as f64 / 1_000.0
}

/// Latency statistics for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyReport {
    /// processed - produce
    pub end_to_end: Option<LatencyStats>,
    /// consume - produce
    pub queue_wait: Option<LatencyStats>,
    /// processed - consume
    pub service: Option<LatencyStats>,
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(end_to_end) = &self.end_to_end else {
            return write!(f, "No latencies recorded.");
        };
        end_to_end.write_block(f, "Latency Statistics (End-to-End)")?;
        if let Some(queue_wait) = &self.queue_wait {
            writeln!(f)?;
            queue_wait.write_block(f, "Queue Wait (produce -> consume)")?;
        }
        if let Some(service) = &self.service {
            writeln!(f)?;
            service.write_block(f, "Service Time (consume -> processed)")?;
        }
        Ok(())
    }
}
