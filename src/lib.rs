// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::{ConfigError, DrainMode, SimulationConfig};
pub use domain::models::types::{Order, OrderId, OrderTimestamps, Price, Quantity, Side};
pub use domain::services::orderbook::{DepthSnapshot, OrderBook, PriceLevel, TopOfBook};
pub use domain::services::matching_engine::{EngineStats, Fill, MatchResult, MatchingEngine};
pub use domain::services::latency::{Clock, LatencyRecorder, LatencyReport, LatencyStats, MonotonicClock};
pub use domain::services::pipeline::{
    OrderConsumer, OrderProducer, OrderQueue, OrderStimulus, OrderSubmitter, PipelineCoordinator,
    PipelineError, RunContext, RunSummary, TryTake, UniformStimulus, order_queue,
};
