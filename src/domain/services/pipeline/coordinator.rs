//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module wires N generator threads and one matching thread around the order queue, runs
// them for the configured duration, and collects the results once every thread has joined.
//
// | Component            | Description                                                     |
// |----------------------|-----------------------------------------------------------------|
// | PipelineCoordinator  | Owns the run configuration and clock, drives one run at a time  |
//
// Topology guarantees a single writer: the engine is moved into the matching thread and moved
// back out through its join handle, so no lock guards the book.
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use chrono::Utc;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::domain::services::latency::{Clock, MonotonicClock};
use crate::domain::services::matching_engine::MatchingEngine;
use crate::domain::services::pipeline::PipelineError;
use crate::domain::services::pipeline::context::RunContext;
use crate::domain::services::pipeline::queue::order_queue;
use crate::domain::services::pipeline::stimulus::{OrderStimulus, UniformStimulus};
use crate::domain::services::pipeline::summary::RunSummary;
use crate::domain::services::pipeline::workers::{run_generator, run_matching};

const MATCHING_THREAD: &str = "matching-engine";

/// Runs the producer/consumer pipeline.
pub struct PipelineCoordinator {
    config: SimulationConfig,
    clock: Arc<dyn Clock>,
}

impl PipelineCoordinator {
    /// Creates a coordinator using the process monotonic clock.
    ///
    /// # Errors
    /// Returns `Config` if the configuration does not validate.
    pub fn new(config: SimulationConfig) -> Result<Self, PipelineError> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Creates a coordinator stamping orders with `clock`.
    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn Clock>) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the simulation with uniformly distributed orders.
    ///
    /// The base seed comes from the configuration, or from entropy when unset. Generator `i`
    /// uses `base_seed + i`.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        self.run_with_stimulus(base_seed, |index| {
            UniformStimulus::for_task(&self.config, base_seed, index)
        })
    }

    /// Runs the simulation with a caller-supplied stimulus per generator.
    ///
    /// `make_stimulus` is called once per generator, with the generator's index, on the calling
    /// thread before that generator starts.
    pub fn run_with_stimulus<S, F>(&self, base_seed: u64, mut make_stimulus: F) -> Result<RunSummary, PipelineError>
    where
        S: OrderStimulus + 'static,
        F: FnMut(usize) -> S,
    {
        let run_id = Uuid::new_v4();
        let _run_span = info_span!("run", %run_id).entered();

        info!(
            producers = self.config.producers,
            duration_ms = self.config.duration.as_millis() as u64,
            base_seed,
            clock = self.clock.name(),
            "Starting simulation"
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let ctx = Arc::new(RunContext::new());
        let (producer, consumer) = order_queue();

        let matching = {
            let ctx = Arc::clone(&ctx);
            let clock = Arc::clone(&self.clock);
            let mode = self.config.drain_mode;
            spawn_named(MATCHING_THREAD.to_string(), move || {
                let _span = info_span!("matching", %run_id).entered();
                run_matching(&ctx, consumer, MatchingEngine::new(), clock.as_ref(), mode)
            })?
        };

        let mut generators = Vec::with_capacity(self.config.producers);
        for index in 0..self.config.producers {
            let stimulus = make_stimulus(index);
            let ctx_handle = Arc::clone(&ctx);
            let task_producer = producer.clone();
            let clock = Arc::clone(&self.clock);
            let pause = self.config.producer_pause;

            let spawned = spawn_named(format!("generator-{index}"), move || {
                let _span = info_span!("generator", %run_id, task = index).entered();
                run_generator(index, &ctx_handle, task_producer, stimulus, clock.as_ref(), pause)
            });

            match spawned {
                Ok(handle) => generators.push(handle),
                Err(err) => {
                    warn!(task = index, "Aborting run: {}", err);
                    ctx.stop();
                    drop(producer);
                    for handle in generators {
                        let _ = handle.join();
                    }
                    let _ = matching.join();
                    return Err(err);
                }
            }
        }
        // Only generators hold submit handles from here on, so the queue closes when they exit.
        drop(producer);

        thread::sleep(self.config.duration);
        info!("Stopping simulation, waiting for threads to finish");
        ctx.stop();

        let mut generated_per_producer = Vec::with_capacity(generators.len());
        let mut first_error = None;
        for (index, handle) in generators.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(emitted)) => generated_per_producer.push(emitted),
                Ok(Err(err)) => {
                    generated_per_producer.push(0);
                    first_error.get_or_insert(err);
                }
                Err(_) => {
                    generated_per_producer.push(0);
                    first_error.get_or_insert(PipelineError::ThreadPanicked(format!("generator-{index}")));
                }
            }
        }
        info!("Producer threads joined");

        let outcome = matching
            .join()
            .map_err(|_| PipelineError::ThreadPanicked(MATCHING_THREAD.to_string()))?;
        info!("Consumer thread joined");

        if let Some(err) = first_error {
            return Err(err);
        }

        let summary = RunSummary {
            run_id,
            started_at,
            elapsed: start.elapsed(),
            config: self.config.clone(),
            base_seed,
            generated_per_producer,
            orders_processed: outcome.engine.stats().orders_processed,
            engine: outcome.engine.stats(),
            top_of_book: outcome.engine.top_of_book(),
            bid_levels: outcome.engine.order_book().bid_levels(),
            ask_levels: outcome.engine.order_book().ask_levels(),
            latency: outcome.recorder.into_report(),
        };

        if summary.orders_undrained() > 0 {
            warn!(undrained = summary.orders_undrained(), "Orders left in the queue at shutdown");
        }
        info!(
            ids_issued = ctx.ids_issued(),
            generated = summary.orders_generated(),
            processed = summary.orders_processed,
            "Simulation finished"
        );

        Ok(summary)
    }
}

fn spawn_named<T, F>(name: String, f: F) -> Result<JoinHandle<T>, PipelineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| PipelineError::Spawn { name, source })
}
