pub mod orderbook;
pub mod matching_engine;
pub mod latency;
pub mod pipeline;
