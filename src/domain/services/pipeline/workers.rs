//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Bodies of the two kinds of pipeline thread.
//
// | Function          | Description                                                        |
// |-------------------|--------------------------------------------------------------------|
// | run_generator     | Build, stamp and submit orders until the run signal drops          |
// | run_matching      | Dequeue, process and record latency until the queue is drained     |
//
// Both loops are generic over the queue ends, so any `OrderSubmitter`/`OrderQueue` pair can sit
// between them. The matching task owns the engine and the latency recorder outright; both are
// moved back to the coordinator through the thread's return value.
//--------------------------------------------------------------------------------------------------

use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DrainMode;
use crate::domain::models::types::Order;
use crate::domain::services::latency::{Clock, LatencyRecorder};
use crate::domain::services::matching_engine::MatchingEngine;
use crate::domain::services::pipeline::PipelineError;
use crate::domain::services::pipeline::context::RunContext;
use crate::domain::services::pipeline::queue::{OrderQueue, OrderSubmitter, TryTake};
use crate::domain::services::pipeline::stimulus::OrderStimulus;

/// What the matching task hands back when it exits.
#[derive(Debug)]
pub struct MatchingOutcome {
    pub engine: MatchingEngine,
    pub recorder: LatencyRecorder,
}

/// Generator loop. Returns the number of orders successfully submitted.
///
/// A submit failure after the run signal has dropped means the consumer already finished
/// draining; the order is discarded and the loop ends normally.
///
/// # Errors
/// Returns `QueueDisconnected` if the consumer disappears while the run is still active.
pub fn run_generator<P: OrderSubmitter, S: OrderStimulus>(
    task_index: usize,
    ctx: &RunContext,
    producer: P,
    mut stimulus: S,
    clock: &dyn Clock,
    pause: Duration,
) -> Result<u64, PipelineError> {
    info!(task = task_index, "Generator started");
    let mut emitted = 0u64;

    while ctx.is_running() {
        let (side, price, quantity) = stimulus.next_order();
        let id = ctx.next_order_id();
        let order = Order::new(id, side, price, quantity, clock.now());

        if let Err(err) = producer.submit(order) {
            if ctx.is_running() {
                warn!(task = task_index, "Order queue disconnected during run");
                return Err(err);
            }
            debug!(task = task_index, id, "Queue closed after shutdown, order dropped");
            break;
        }
        emitted += 1;

        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    info!(task = task_index, emitted, "Generator stopped");
    Ok(emitted)
}

/// Matching loop. Consumes the queue, applies each order to `engine` and records its latency.
///
/// Orders whose stamps are out of order (`produce <= consume <= processed` does not hold) are
/// still applied to the book but contribute no latency sample; their number is logged once on exit.
pub fn run_matching<Q: OrderQueue>(
    ctx: &RunContext,
    consumer: Q,
    mut engine: MatchingEngine,
    clock: &dyn Clock,
    mode: DrainMode,
) -> MatchingOutcome {
    info!(mode = ?mode, "Matching engine started");
    let mut recorder = LatencyRecorder::with_capacity(1 << 16);

    match mode {
        DrainMode::Spin => {
            // Size reads race with producers; the loop only needs to see a true empty
            // eventually after the signal drops.
            while ctx.is_running() || consumer.approx_size() > 0 {
                match consumer.try_take() {
                    TryTake::Order(mut order) => {
                        handle_order(&mut order, &mut engine, &mut recorder, clock);
                    }
                    TryTake::Empty => {
                        if ctx.is_running() {
                            thread::yield_now();
                        }
                    }
                    TryTake::Closed => break,
                }
            }
        }
        DrainMode::Blocking => {
            while let Some(mut order) = consumer.take() {
                handle_order(&mut order, &mut engine, &mut recorder, clock);
            }
        }
    }

    let processed = engine.stats().orders_processed;
    let unrecorded = processed.saturating_sub(recorder.len() as u64);
    if unrecorded > 0 {
        warn!(unrecorded, "Orders with non-causal stamps were left out of the latency samples");
    }
    info!(processed, "Matching engine stopped");
    MatchingOutcome { engine, recorder }
}

#[inline]
fn handle_order(order: &mut Order, engine: &mut MatchingEngine, recorder: &mut LatencyRecorder, clock: &dyn Clock) {
    order.timestamps.mark_consumed(clock.now());
    engine.process(order);
    order.timestamps.mark_processed(clock.now());

    recorder.record(&order.timestamps);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::types::{Price, Quantity, Side};
    use crate::domain::services::latency::MonotonicClock;
    use crate::domain::services::orderbook::PriceLevel;
    use crate::domain::services::pipeline::queue::order_queue;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// Replays a fixed list of orders, then repeats the last one.
    struct ScriptedStimulus {
        script: Vec<(Side, Price, Quantity)>,
        cursor: usize,
    }

    impl OrderStimulus for ScriptedStimulus {
        fn next_order(&mut self) -> (Side, Price, Quantity) {
            let idx = self.cursor.min(self.script.len() - 1);
            self.cursor += 1;
            self.script[idx]
        }
    }

    #[test]
    fn test_matching_drains_queue_after_stop() {
        let ctx = RunContext::new();
        let (producer, consumer) = order_queue();
        let clock = MonotonicClock::new();

        producer.submit(Order::new(0, Side::Sell, 101, 5, clock.now())).unwrap();
        producer.submit(Order::new(1, Side::Sell, 102, 5, clock.now())).unwrap();
        producer.submit(Order::new(2, Side::Buy, 102, 12, clock.now())).unwrap();
        ctx.stop();

        let outcome = run_matching(&ctx, consumer, MatchingEngine::new(), &clock, DrainMode::Spin);

        assert_eq!(outcome.recorder.len(), 3);
        assert_eq!(outcome.engine.stats().orders_processed, 3);
        assert_eq!(outcome.engine.top_of_book().bid, Some(PriceLevel::new(102, 2)));
        assert_eq!(outcome.engine.top_of_book().ask, None);
        drop(producer);
    }

    #[test]
    fn test_blocking_mode_ends_on_close() {
        let ctx = RunContext::new();
        let (producer, consumer) = order_queue();
        let clock = MonotonicClock::new();

        for id in 0..10 {
            producer.submit(Order::new(id, Side::Buy, 100, 1, Instant::now())).unwrap();
        }
        drop(producer);

        let outcome = run_matching(&ctx, consumer, MatchingEngine::new(), &clock, DrainMode::Blocking);
        assert_eq!(outcome.recorder.len(), 10);
        assert_eq!(outcome.engine.order_book().volume_at(Side::Buy, 100), Some(10));
    }

    #[test]
    fn test_generator_stops_on_signal() {
        let ctx = Arc::new(RunContext::new());
        let (producer, consumer) = order_queue();

        let worker_ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || {
            let stimulus = ScriptedStimulus {
                script: vec![(Side::Buy, 100, 1), (Side::Sell, 101, 2)],
                cursor: 0,
            };
            run_generator(0, &worker_ctx, producer, stimulus, &MonotonicClock, Duration::from_micros(50))
        });

        thread::sleep(Duration::from_millis(20));
        ctx.stop();
        let emitted = handle.join().unwrap().unwrap();

        assert!(emitted > 0);
        assert_eq!(consumer.approx_size() as u64, emitted);
        assert_eq!(ctx.ids_issued(), emitted);

        let TryTake::Order(first) = consumer.try_take() else { panic!("expected an order") };
        assert_eq!((first.side, first.price, first.quantity), (Side::Buy, 100, 1));
    }

    #[test]
    fn test_generator_errors_when_consumer_gone_mid_run() {
        let ctx = RunContext::new();
        let (producer, consumer) = order_queue();
        drop(consumer);

        let stimulus = ScriptedStimulus { script: vec![(Side::Buy, 100, 1)], cursor: 0 };
        let result = run_generator(0, &ctx, producer, stimulus, &MonotonicClock, Duration::ZERO);
        assert!(matches!(result, Err(PipelineError::QueueDisconnected)));
    }

    /// Pre-filled queue with no producers: `take` ends as soon as it is empty.
    struct ReplayQueue {
        orders: Mutex<VecDeque<Order>>,
    }

    impl OrderQueue for ReplayQueue {
        fn try_take(&self) -> TryTake {
            match self.orders.lock().unwrap().pop_front() {
                Some(order) => TryTake::Order(order),
                None => TryTake::Closed,
            }
        }

        fn take(&self) -> Option<Order> {
            self.orders.lock().unwrap().pop_front()
        }

        fn approx_size(&self) -> usize {
            self.orders.lock().unwrap().len()
        }
    }

    /// Each read is one microsecond earlier than the last.
    struct RewindingClock {
        origin: Instant,
        ticks: AtomicU64,
    }

    impl Clock for RewindingClock {
        fn now(&self) -> Instant {
            let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
            self.origin - Duration::from_micros(tick)
        }
    }

    #[test]
    fn test_matching_runs_over_any_queue() {
        let clock = MonotonicClock::new();
        let orders = vec![
            Order::new(0, Side::Buy, 100, 3, clock.now()),
            Order::new(1, Side::Sell, 99, 5, clock.now()),
        ];

        let ctx = RunContext::new();
        ctx.stop();
        for mode in [DrainMode::Spin, DrainMode::Blocking] {
            let queue = ReplayQueue { orders: Mutex::new(orders.iter().cloned().collect()) };
            let outcome = run_matching(&ctx, queue, MatchingEngine::new(), &clock, mode);

            assert_eq!(outcome.recorder.len(), 2);
            assert_eq!(outcome.engine.top_of_book().ask, Some(PriceLevel::new(99, 2)));
            assert_eq!(outcome.engine.top_of_book().bid, None);
        }
    }

    #[test]
    fn test_non_causal_stamps_are_not_recorded() {
        let origin = Instant::now() + Duration::from_secs(1);
        let clock = RewindingClock { origin, ticks: AtomicU64::new(0) };
        let (producer, consumer) = order_queue();
        producer.submit(Order::new(0, Side::Buy, 100, 1, origin)).unwrap();
        producer.submit(Order::new(1, Side::Buy, 100, 1, origin)).unwrap();
        drop(producer);

        let ctx = RunContext::new();
        let outcome = run_matching(&ctx, consumer, MatchingEngine::new(), &clock, DrainMode::Blocking);

        assert_eq!(outcome.engine.stats().orders_processed, 2);
        assert_eq!(outcome.engine.order_book().volume_at(Side::Buy, 100), Some(2));
        assert!(outcome.recorder.is_empty());
    }
}
