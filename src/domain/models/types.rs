//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types that flow through the venue: the order produced by a
// generator, the side it trades on, and the three monotonic instants stamped along its lifecycle.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ALIASES            | Price, Quantity and OrderId scalar types.                        |
// | ENUMS              | Side of an order.                                                |
// | STRUCTS            | Order and its lifecycle timestamps.                              |
// | TESTS              | Unit tests for the defined types.                                |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::time::{Duration, Instant};
use serde::{Serialize, Deserialize};

/// Integer tick value.
pub type Price = i64;

/// Units remaining to fill. Unsigned so a level can never be driven below zero.
pub type Quantity = u64;

/// Process-unique order identifier.
pub type OrderId = u64;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                 |
// |---------------|---------------------------------------------|
// | Side          | Represents the side of an order (Buy/Sell). |
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// A buy order, rests on the bid side.
    Buy,
    /// A sell order, rests on the ask side.
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                           |
// |-----------------|-------------------------------------------------------|
// | OrderTimestamps | Produce / consume / processed instants of an order.   |
// | Order           | A limit order travelling from a generator to the book.|
//--------------------------------------------------------------------------------------------------

/// The three monotonic instants of an order's lifecycle.
///
/// `produced` is set when the order is built. `consumed` and `processed` are each set once by
/// the matching task; later calls to the setters are ignored so the first stamp wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTimestamps {
    produced: Instant,
    consumed: Option<Instant>,
    processed: Option<Instant>,
}

impl OrderTimestamps {
    pub fn new(produced: Instant) -> Self {
        Self {
            produced,
            consumed: None,
            processed: None,
        }
    }

    /// Records the dequeue instant. Has no effect if already stamped.
    #[inline]
    pub fn mark_consumed(&mut self, at: Instant) {
        if self.consumed.is_none() {
            self.consumed = Some(at);
        }
    }

    /// Records the completion instant. Has no effect if already stamped.
    #[inline]
    pub fn mark_processed(&mut self, at: Instant) {
        if self.processed.is_none() {
            self.processed = Some(at);
        }
    }

    /// Time spent between creation and dequeue.
    pub fn queue_wait(&self) -> Option<Duration> {
        self.consumed.map(|c| c.saturating_duration_since(self.produced))
    }

    /// Time spent inside the matching engine.
    pub fn service_time(&self) -> Option<Duration> {
        match (self.consumed, self.processed) {
            (Some(c), Some(p)) => Some(p.saturating_duration_since(c)),
            _ => None,
        }
    }

    /// Full creation-to-completion latency, available once the order has been processed.
    pub fn end_to_end(&self) -> Option<Duration> {
        self.processed.map(|p| p.saturating_duration_since(self.produced))
    }

    /// True when the stamps that are set respect produce <= consume <= processed.
    pub fn is_causal(&self) -> bool {
        match (self.consumed, self.processed) {
            (Some(c), Some(p)) => self.produced <= c && c <= p,
            (Some(c), None) => self.produced <= c,
            (None, Some(_)) => false,
            (None, None) => true,
        }
    }
}

/// A limit order for the single instrument traded by the venue.
///
/// Only `quantity` changes after construction: the matching engine decrements it as the order
/// fills. Orders are created with a strictly positive quantity; the book does not check this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique identifier assigned by the generator.
    pub id: OrderId,
    /// Side of the order.
    pub side: Side,
    /// Limit price in ticks.
    pub price: Price,
    /// Remaining quantity to fill.
    pub quantity: Quantity,
    /// Lifecycle instants.
    pub timestamps: OrderTimestamps,
}

impl Order {
    /// Creates a new limit order stamped as produced at `produced`.
    pub fn new(id: OrderId, side: Side, price: Price, quantity: Quantity, produced: Instant) -> Self {
        Self {
            id,
            side,
            price,
            quantity,
            timestamps: OrderTimestamps::new(produced),
        }
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }
}
