//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Multi-producer, single-consumer order handoff. The contract is split by end: producers only
// submit, and the one consumer takes and sizes. The default implementation is an unbounded
// crossbeam channel.
//
// | Name            | Description                                       | Key Methods         |
// |-----------------|---------------------------------------------------|---------------------|
// | OrderSubmitter  | Trait for the submit end                          | submit              |
// | OrderQueue      | Trait for the consuming end                       | try_take            |
// |                 |                                                   | take                |
// |                 |                                                   | approx_size         |
// |-----------------|---------------------------------------------------|---------------------|
// | OrderProducer   | Cloneable channel sender, one clone per generator | submit              |
// | OrderConsumer   | Channel receiver, owned by the matching task only | try_take            |
//
// Submission never blocks and only fails once the consumer is gone. Per-producer FIFO holds;
// orders from different producers interleave arbitrarily.
//--------------------------------------------------------------------------------------------------

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use crate::domain::models::types::Order;
use crate::domain::services::pipeline::PipelineError;

/// Submit end of an order queue. Cloned once per generator.
pub trait OrderSubmitter: Clone + Send {
    /// Enqueues `order` without blocking.
    ///
    /// # Errors
    /// Returns `QueueDisconnected` if the consuming end has been dropped.
    fn submit(&self, order: Order) -> Result<(), PipelineError>;
}

/// Consuming end of an order queue. There is exactly one, owned by the matching task.
pub trait OrderQueue: Send {
    /// Dequeues the next order if one is ready.
    fn try_take(&self) -> TryTake;

    /// Blocks until an order arrives. Returns `None` once every submitter is gone and the queue
    /// has been drained.
    fn take(&self) -> Option<Order>;

    /// Best-effort number of queued orders. May be stale by the time the caller reads it.
    fn approx_size(&self) -> usize;
}

/// Creates a new order queue and returns its two ends.
pub fn order_queue() -> (OrderProducer, OrderConsumer) {
    let (tx, rx) = unbounded();
    (OrderProducer { tx }, OrderConsumer { rx })
}

/// Outcome of a non-blocking dequeue.
#[derive(Debug)]
pub enum TryTake {
    Order(Order),
    Empty,
    /// Every producer has been dropped and the queue is drained.
    Closed,
}

/// Submit side of the queue.
#[derive(Debug, Clone)]
pub struct OrderProducer {
    tx: Sender<Order>,
}

impl OrderSubmitter for OrderProducer {
    #[inline]
    fn submit(&self, order: Order) -> Result<(), PipelineError> {
        self.tx.send(order).map_err(|_| PipelineError::QueueDisconnected)
    }
}

/// Receive side of the queue. Not `Clone`: there is exactly one consumer.
#[derive(Debug)]
pub struct OrderConsumer {
    rx: Receiver<Order>,
}

impl OrderQueue for OrderConsumer {
    #[inline]
    fn try_take(&self) -> TryTake {
        match self.rx.try_recv() {
            Ok(order) => TryTake::Order(order),
            Err(TryRecvError::Empty) => TryTake::Empty,
            Err(TryRecvError::Disconnected) => TryTake::Closed,
        }
    }

    #[inline]
    fn take(&self) -> Option<Order> {
        self.rx.recv().ok()
    }

    #[inline]
    fn approx_size(&self) -> usize {
        self.rx.len()
    }
}
