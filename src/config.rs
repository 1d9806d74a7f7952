use dotenv::dotenv;
use serde::{Serialize, Deserialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::models::types::{Price, Quantity};

const PRODUCERS: &str = "VENUE_PRODUCERS";
const DURATION_MS: &str = "VENUE_DURATION_MS";
const PRICE_MIN: &str = "VENUE_PRICE_MIN";
const PRICE_MAX: &str = "VENUE_PRICE_MAX";
const QTY_MIN: &str = "VENUE_QTY_MIN";
const QTY_MAX: &str = "VENUE_QTY_MAX";
const PAUSE_US: &str = "VENUE_PAUSE_US";
const DRAIN_MODE: &str = "VENUE_DRAIN_MODE";
const SEED: &str = "VENUE_SEED";

/// Errors raised while loading or validating the simulation configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse environment variable {key}={value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("at least one producer is required")]
    NoProducers,

    #[error("run duration must be greater than zero")]
    ZeroDuration,

    #[error("invalid price range {min}..={max}")]
    InvalidPriceRange { min: Price, max: Price },

    #[error("invalid quantity range {min}..={max} (minimum must be at least 1)")]
    InvalidQuantityRange { min: Quantity, max: Quantity },

    #[error("unknown drain mode '{0}' (expected 'spin' or 'blocking')")]
    UnknownDrainMode(String),
}

/// How the matching task waits for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrainMode {
    /// Non-blocking dequeue, yield the processor while empty. Lowest latency, burns a core.
    #[default]
    Spin,
    /// Blocking receive that ends when every producer has hung up. Idle-friendly.
    Blocking,
}

impl FromStr for DrainMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spin" => Ok(Self::Spin),
            "blocking" => Ok(Self::Blocking),
            other => Err(ConfigError::UnknownDrainMode(other.to_string())),
        }
    }
}

/// Parameters of a simulation run. Fixed once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of generator threads
    pub producers: usize,
    /// Wall-clock time before the run signal drops
    pub duration: Duration,
    /// Lowest generated price, inclusive
    pub price_min: Price,
    /// Highest generated price, inclusive
    pub price_max: Price,
    /// Smallest generated quantity, inclusive
    pub quantity_min: Quantity,
    /// Largest generated quantity, inclusive
    pub quantity_max: Quantity,
    /// Sleep after each emission to bound the per-generator rate
    pub producer_pause: Duration,
    /// Matching task wait strategy
    pub drain_mode: DrainMode,
    /// Base seed for generator RNGs; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            producers: 4,
            duration: Duration::from_secs(10),
            price_min: 95,
            price_max: 105,
            quantity_min: 1,
            quantity_max: 10,
            producer_pause: Duration::from_micros(10),
            drain_mode: DrainMode::Spin,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Builds a configuration from the defaults overlaid with `VENUE_*` environment variables.
    /// A `.env` file in the working directory is loaded first if present.
    pub fn try_from_env() -> Result<SimulationConfig, ConfigError> {
        dotenv().ok();

        let mut config = SimulationConfig::default();

        if let Some(producers) = env_parse(PRODUCERS)? {
            config.producers = producers;
        }
        if let Some(ms) = env_parse::<u64>(DURATION_MS)? {
            config.duration = Duration::from_millis(ms);
        }
        if let Some(min) = env_parse(PRICE_MIN)? {
            config.price_min = min;
        }
        if let Some(max) = env_parse(PRICE_MAX)? {
            config.price_max = max;
        }
        if let Some(min) = env_parse(QTY_MIN)? {
            config.quantity_min = min;
        }
        if let Some(max) = env_parse(QTY_MAX)? {
            config.quantity_max = max;
        }
        if let Some(us) = env_parse::<u64>(PAUSE_US)? {
            config.producer_pause = Duration::from_micros(us);
        }
        if let Ok(mode) = env::var(DRAIN_MODE) {
            config.drain_mode = mode.parse()?;
        }
        if let Some(seed) = env_parse(SEED)? {
            config.seed = Some(seed);
        }

        info!(
            producers = config.producers,
            duration_ms = config.duration.as_millis() as u64,
            drain_mode = ?config.drain_mode,
            "Loaded simulation config from environment"
        );

        Ok(config)
    }

    /// Checks the invariants the pipeline and stimulus generator rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.price_min > self.price_max {
            return Err(ConfigError::InvalidPriceRange {
                min: self.price_min,
                max: self.price_max,
            });
        }
        if self.quantity_min == 0 || self.quantity_min > self.quantity_max {
            return Err(ConfigError::InvalidQuantityRange {
                min: self.quantity_min,
                max: self.quantity_max,
            });
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
        Err(_) => Ok(None),
    }
}
