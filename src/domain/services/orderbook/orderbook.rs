//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements an aggregated limit order book for the single instrument of the venue.
// Each side is a map from price to the total quantity resting there. No per-order identity is
// kept at a level, so the book offers price priority only.
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | OrderBook     | Bid and ask level maps with aggregate-add and take-from-best primitives   |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name              | Description                                   | Return Type             |
// |-------------------|-----------------------------------------------|-------------------------|
// | new               | Creates an empty book                         | OrderBook               |
// | add_to_book       | Aggregates quantity into a level              | ()                      |
// | take_best         | Consumes liquidity from the best level        | Option<(Price, Qty)>    |
// | best_bid          | Highest bid level                             | Option<PriceLevel>      |
// | best_ask          | Lowest ask level                              | Option<PriceLevel>      |
// | top_of_book       | Best level per side                           | TopOfBook               |
// | depth             | Best N levels per side                        | DepthSnapshot           |
// | volume_at         | Aggregate quantity at one price               | Option<Quantity>        |
// | bid_levels        | Number of bid price levels                    | usize                   |
// | ask_levels        | Number of ask price levels                    | usize                   |
//
//--------------------------------------------------------------------------------------------------
// TESTS
//--------------------------------------------------------------------------------------------------
// | Name                              | Description                                          |
// |-----------------------------------|------------------------------------------------------|
// | test_empty_orderbook              | Verifies initial empty state                         |
// | test_add_aggregates_same_price    | 5 then 3 at one price gives a single level of 8      |
// | test_price_ordering               | Best bid is highest, best ask is lowest              |
// | test_take_best_partial            | Partial take leaves the residual at the level        |
// | test_take_best_exhausts_level     | A level taken to zero disappears                     |
// | test_take_best_respects_limit     | Non-marketable levels are never touched              |
// | test_depth_limit                  | Depth is truncated and ordered best first            |
// | test_level_counts                 | Level counts follow adds and exhausted levels        |
//--------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use crate::domain::models::types::{Price, Quantity, Side};
use crate::domain::services::orderbook::depth::{DepthSnapshot, PriceLevel, TopOfBook};

/// Aggregated two-sided book.
///
/// Both sides are stored ascending by price; the bid side is read from the back so the best bid
/// is the highest key. A level is present only while its quantity is strictly positive.
#[derive(Debug, Default, Clone)]
pub struct OrderBook {
    /// Bid levels, best = last key
    bids: BTreeMap<Price, Quantity>,
    /// Ask levels, best = first key
    asks: BTreeMap<Price, Quantity>,
}

impl OrderBook {
    /// Creates a new empty order book.
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    #[inline]
    fn levels(&self, side: Side) -> &BTreeMap<Price, Quantity> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Adds `quantity` to the level at `price` on the side an order of `side` rests on.
    ///
    /// The level is created if absent. Adding zero is a no-op so no empty level can appear.
    #[inline]
    pub fn add_to_book(&mut self, price: Price, quantity: Quantity, side: Side) {
        if quantity == 0 {
            return;
        }
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        *levels.entry(price).or_insert(0) += quantity;
    }

    /// Takes up to `wanted` units from the best level resting on `resting`, provided that level
    /// is marketable against `limit`.
    ///
    /// For the ask side a level is marketable when its price is at or below `limit`; for the bid
    /// side when its price is at or above `limit`. A level driven to zero is removed before the
    /// call returns.
    ///
    /// # Returns
    /// * `Some((price, taken))` - The level price and quantity taken from it (`taken > 0`)
    /// * `None` - The side is empty, the best level does not cross `limit`, or `wanted` is zero
    pub fn take_best(&mut self, resting: Side, limit: Price, wanted: Quantity) -> Option<(Price, Quantity)> {
        if wanted == 0 {
            return None;
        }

        let mut entry = match resting {
            Side::Sell => self.asks.first_entry()?,
            Side::Buy => self.bids.last_entry()?,
        };

        let level_price = *entry.key();
        let marketable = match resting {
            Side::Sell => level_price <= limit,
            Side::Buy => level_price >= limit,
        };
        if !marketable {
            return None;
        }

        let level_quantity = entry.get_mut();
        let taken = wanted.min(*level_quantity);
        *level_quantity -= taken;
        if *level_quantity == 0 {
            entry.remove();
        }

        Some((level_price, taken))
    }

    #[inline]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids
            .last_key_value()
            .map(|(&price, &quantity)| PriceLevel::new(price, quantity))
    }

    #[inline]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks
            .first_key_value()
            .map(|(&price, &quantity)| PriceLevel::new(price, quantity))
    }

    /// Best level on each side.
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.best_bid(),
            ask: self.best_ask(),
        }
    }

    /// Current spread (best ask - best bid), if both sides have liquidity.
    pub fn spread(&self) -> Option<Price> {
        self.top_of_book().spread()
    }

    /// Aggregate quantity at `price` on the side an order of `side` rests on.
    pub fn volume_at(&self, side: Side, price: Price) -> Option<Quantity> {
        self.levels(side).get(&price).copied()
    }

    /// Number of distinct price levels on one side.
    pub fn level_count(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Sum of all resting quantity on one side.
    pub fn total_volume(&self, side: Side) -> Quantity {
        self.levels(side).values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Snapshot of the best `limit` levels per side, best first.
    pub fn depth(&self, limit: usize) -> DepthSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(limit)
            .map(|(&price, &quantity)| PriceLevel::new(price, quantity))
            .collect();
        let asks = self
            .asks
            .iter()
            .take(limit)
            .map(|(&price, &quantity)| PriceLevel::new(price, quantity))
            .collect();
        DepthSnapshot::new(bids, asks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_orderbook() {
        let book = OrderBook::new();
        assert!(book.is_empty());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.top_of_book(), TopOfBook::default());
        assert_eq!(book.spread(), None);
    }

    #[test]
    fn test_add_aggregates_same_price() {
        let mut book = OrderBook::new();
        book.add_to_book(100, 5, Side::Buy);
        book.add_to_book(100, 3, Side::Buy);

        assert_eq!(book.level_count(Side::Buy), 1);
        assert_eq!(book.volume_at(Side::Buy, 100), Some(8));
        assert_eq!(book.level_count(Side::Sell), 0);
    }

    #[test]
    fn test_add_zero_creates_no_level() {
        let mut book = OrderBook::new();
        book.add_to_book(100, 0, Side::Sell);
        assert!(book.is_empty());
    }

    #[test]
    fn test_price_ordering() {
        let mut book = OrderBook::new();
        for price in [97, 99, 98] {
            book.add_to_book(price, 1, Side::Buy);
        }
        for price in [104, 102, 103] {
            book.add_to_book(price, 2, Side::Sell);
        }

        assert_eq!(book.best_bid(), Some(PriceLevel::new(99, 1)));
        assert_eq!(book.best_ask(), Some(PriceLevel::new(102, 2)));
        assert_eq!(book.spread(), Some(3));
        assert_eq!(book.total_volume(Side::Buy), 3);
        assert_eq!(book.total_volume(Side::Sell), 6);
    }

    #[test]
    fn test_take_best_partial() {
        let mut book = OrderBook::new();
        book.add_to_book(101, 10, Side::Sell);

        let taken = book.take_best(Side::Sell, 101, 4);
        assert_eq!(taken, Some((101, 4)));
        assert_eq!(book.volume_at(Side::Sell, 101), Some(6));
    }

    #[test]
    fn test_take_best_exhausts_level() {
        let mut book = OrderBook::new();
        book.add_to_book(100, 5, Side::Buy);
        book.add_to_book(99, 5, Side::Buy);

        let taken = book.take_best(Side::Buy, 95, 8);
        assert_eq!(taken, Some((100, 5)));
        assert_eq!(book.volume_at(Side::Buy, 100), None);
        assert_eq!(book.best_bid(), Some(PriceLevel::new(99, 5)));
    }

    #[test]
    fn test_take_best_respects_limit() {
        let mut book = OrderBook::new();
        book.add_to_book(102, 5, Side::Sell);
        book.add_to_book(98, 5, Side::Buy);

        assert_eq!(book.take_best(Side::Sell, 101, 5), None);
        assert_eq!(book.take_best(Side::Buy, 99, 5), None);
        assert_eq!(book.take_best(Side::Sell, 102, 0), None);
        assert_eq!(book.volume_at(Side::Sell, 102), Some(5));
        assert_eq!(book.volume_at(Side::Buy, 98), Some(5));
    }

    #[test]
    fn test_depth_limit() {
        let mut book = OrderBook::new();
        for (i, price) in (95..=99).enumerate() {
            book.add_to_book(price, i as Quantity + 1, Side::Buy);
        }
        for price in 101..=103 {
            book.add_to_book(price, 1, Side::Sell);
        }

        let depth = book.depth(2);
        assert_eq!(depth.bids, vec![PriceLevel::new(99, 5), PriceLevel::new(98, 4)]);
        assert_eq!(depth.asks, vec![PriceLevel::new(101, 1), PriceLevel::new(102, 1)]);
        assert_eq!(depth.spread(), Some(2));
    }

    #[test]
    fn test_level_counts() {
        let mut book = OrderBook::new();
        book.add_to_book(99, 2, Side::Buy);
        book.add_to_book(98, 2, Side::Buy);
        book.add_to_book(99, 1, Side::Buy);
        book.add_to_book(101, 4, Side::Sell);
        assert_eq!((book.bid_levels(), book.ask_levels()), (2, 1));

        book.take_best(Side::Sell, 101, 4);
        assert_eq!((book.bid_levels(), book.ask_levels()), (2, 0));
        assert_eq!(book.bid_levels(), book.level_count(Side::Buy));
    }
}
