use thiserror::Error;

pub mod context;
pub mod coordinator;
pub mod queue;
pub mod stimulus;
pub mod summary;
pub mod workers;

pub use self::context::RunContext;
pub use self::coordinator::PipelineCoordinator;
pub use self::queue::{OrderConsumer, OrderProducer, OrderQueue, OrderSubmitter, TryTake, order_queue};
pub use self::stimulus::{OrderStimulus, UniformStimulus};
pub use self::summary::RunSummary;

/// Errors that can end a simulation run early.
///
/// The matching core itself has no failure paths; these cover the threads and the handoff
/// around it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A worker thread could not be started
    #[error("Failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before returning
    #[error("Thread {0} panicked")]
    ThreadPanicked(String),

    /// The consumer side of the order queue went away while producers were still active
    #[error("Order queue disconnected")]
    QueueDisconnected,
}
