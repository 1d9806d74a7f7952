pub mod clock;
pub mod recorder;
pub mod stats;

pub use self::clock::{Clock, MonotonicClock};
pub use self::recorder::LatencyRecorder;
pub use self::stats::{LatencyReport, LatencyStats, percentile_index};
