use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::domain::models::types::{Price, Quantity, Side};

/// Produces the (side, price, quantity) triple for each new order.
pub trait OrderStimulus: Send {
    fn next_order(&mut self) -> (Side, Price, Quantity);
}

/// Uniform side, price and quantity drawn from a private seeded RNG.
#[derive(Debug, Clone)]
pub struct UniformStimulus {
    rng: StdRng,
    price: Uniform<Price>,
    quantity: Uniform<Quantity>,
}

impl UniformStimulus {
    /// Ranges are inclusive and must be non-empty.
    pub fn new(seed: u64, price_min: Price, price_max: Price, quantity_min: Quantity, quantity_max: Quantity) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            price: Uniform::new_inclusive(price_min, price_max),
            quantity: Uniform::new_inclusive(quantity_min, quantity_max),
        }
    }

    /// Stimulus for generator `task_index`, seeded distinctly from every other task of the run.
    pub fn for_task(config: &SimulationConfig, base_seed: u64, task_index: usize) -> Self {
        Self::new(
            base_seed.wrapping_add(task_index as u64),
            config.price_min,
            config.price_max,
            config.quantity_min,
            config.quantity_max,
        )
    }
}

impl OrderStimulus for UniformStimulus {
    #[inline]
    fn next_order(&mut self) -> (Side, Price, Quantity) {
        let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = self.price.sample(&mut self.rng);
        let quantity = self.quantity.sample(&mut self.rng);
        (side, price, quantity)
    }
}
