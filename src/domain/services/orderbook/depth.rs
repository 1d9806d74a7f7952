//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Read-only views over the aggregated order book.
//
// | Component        | Description                                                      |
// |------------------|------------------------------------------------------------------|
// | PriceLevel       | Aggregate resting quantity at one price                          |
// | TopOfBook        | Best bid and best ask, either of which may be absent             |
// | DepthSnapshot    | Point-in-time list of the best N levels on each side             |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::domain::models::types::{Price, Quantity};

/// Aggregated resting quantity at a single price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// The price for this level
    pub price: Price,
    /// Total quantity resting at this price
    pub quantity: Quantity,
}

impl PriceLevel {
    #[inline]
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// Best level on each side of the book. `None` means that side is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<PriceLevel>,
    pub ask: Option<PriceLevel>,
}

impl TopOfBook {
    /// Returns the current spread (best ask - best bid)
    #[inline]
    pub fn spread(&self) -> Option<Price> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// A book is crossed when the best bid is at or above the best ask.
    #[inline]
    pub fn is_crossed(&self) -> bool {
        matches!(self.spread(), Some(spread) if spread <= 0)
    }
}

impl fmt::Display for TopOfBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Top of Book ---")?;
        match self.bid {
            Some(level) => writeln!(f, "BIDS: {} @ {}", level.quantity, level.price)?,
            None => writeln!(f, "BIDS: [EMPTY]")?,
        }
        match self.ask {
            Some(level) => writeln!(f, "ASKS: {} @ {}", level.quantity, level.price)?,
            None => writeln!(f, "ASKS: [EMPTY]")?,
        }
        write!(f, "-------------------")
    }
}

/// An immutable snapshot of order book depth at a specific point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid price levels ordered by price descending (best bids first)
    pub bids: Vec<PriceLevel>,
    /// Ask price levels ordered by price ascending (best asks first)
    pub asks: Vec<PriceLevel>,
    /// Timestamp when this snapshot was taken
    pub timestamp: DateTime<Utc>,
}

impl DepthSnapshot {
    #[inline]
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self {
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    #[inline]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }
}
