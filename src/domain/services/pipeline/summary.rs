use std::fmt;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::domain::services::latency::LatencyReport;
use crate::domain::services::matching_engine::EngineStats;
use crate::domain::services::orderbook::TopOfBook;

/// Everything known about a run once all of its threads have joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier attached to every log line of the run
    pub run_id: Uuid,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Time from start until the last thread joined
    pub elapsed: Duration,
    /// Configuration the run used
    pub config: SimulationConfig,
    /// Base seed the generator RNGs were derived from
    pub base_seed: u64,
    /// Orders submitted by each generator, indexed by task
    pub generated_per_producer: Vec<u64>,
    /// Orders fully processed by the matching task
    pub orders_processed: u64,
    /// Matching engine totals
    pub engine: EngineStats,
    /// Final best bid and ask
    pub top_of_book: TopOfBook,
    /// Price levels left on the bid side
    pub bid_levels: usize,
    /// Price levels left on the ask side
    pub ask_levels: usize,
    /// Latency statistics
    pub latency: LatencyReport,
}

impl RunSummary {
    pub fn orders_generated(&self) -> u64 {
        self.generated_per_producer.iter().sum()
    }

    /// Orders that were submitted but never processed. Only the spin drain can leave these,
    /// through its approximate-size exit check.
    pub fn orders_undrained(&self) -> u64 {
        self.orders_generated().saturating_sub(self.orders_processed)
    }

    /// Processed orders per second of elapsed run time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.orders_processed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- FINAL ---")?;
        writeln!(f, "{}", self.top_of_book)?;
        writeln!(f, "Resting levels: {} bid / {} ask", self.bid_levels, self.ask_levels)?;
        writeln!(
            f,
            "Generated: {}  Processed: {}  Fills: {}  Matched volume: {}  ({:.0} orders/s)",
            self.orders_generated(),
            self.orders_processed,
            self.engine.fills,
            self.engine.matched_volume,
            self.throughput(),
        )?;
        writeln!(f)?;
        write!(f, "{}", self.latency)
    }
}
