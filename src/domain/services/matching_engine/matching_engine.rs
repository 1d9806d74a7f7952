//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the matching engine for the venue's single instrument.
// Matching follows price priority only: resting liquidity at a price is one aggregate quantity,
// so an incoming order decrements the level with no notion of which order contributed it.
//
// | Component                | Description                                                |
// |--------------------------|------------------------------------------------------------|
// | MatchingEngine           | Owns the order book and applies each incoming order to it  |
// | MatchResult              | Outcome of processing one order                            |
// | Fill                     | Quantity taken from one opposing price level               |
// | EngineStats              | Running totals over every processed order                  |
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | MatchingEngine          | Core matching engine                              | process           |
// |                         |                                                   | match_buy         |
// |                         |                                                   | match_sell        |
// |                         |                                                   | top_of_book       |
// |-------------------------|---------------------------------------------------|-------------------|
// | MatchResult             | Result of a matching operation                    | fills             |
// |                         |                                                   | matched, rested   |
//--------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::domain::models::types::{Order, OrderId, Price, Quantity, Side};
use crate::domain::services::orderbook::{DepthSnapshot, OrderBook, TopOfBook};

/// Quantity executed against a single opposing price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Price of the resting level
    pub price: Price,
    /// Quantity taken from that level
    pub quantity: Quantity,
}

/// Represents the outcome of processing one order.
///
/// `matched + rested` always equals the quantity the order arrived with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Id of the incoming order
    pub order_id: OrderId,
    /// Fills against opposing levels, best price first
    pub fills: Vec<Fill>,
    /// Total quantity executed
    pub matched: Quantity,
    /// Quantity added to the order's own side of the book
    pub rested: Quantity,
}

impl MatchResult {
    #[inline]
    pub fn is_fully_filled(&self) -> bool {
        self.rested == 0
    }
}

/// Running totals kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Orders passed to `process`
    pub orders_processed: u64,
    /// Orders whose full quantity executed on arrival
    pub orders_fully_filled: u64,
    /// Orders that left some quantity resting
    pub orders_rested: u64,
    /// Individual level fills
    pub fills: u64,
    /// Total executed quantity
    pub matched_volume: u64,
}

/// The matching engine. It owns exactly one [`OrderBook`] for its whole lifetime and is the only
/// component that mutates it.
///
/// # Price Priority
///
/// * A buy scans asks from the lowest price upward while the ask price is at or below the
///   buy limit.
/// * A sell scans bids from the highest price downward while the bid price is at or above the
///   sell limit.
/// * Whatever is left after the scan rests on the order's own side at its limit price.
///
/// Because the scan stops at the first non-marketable level and any remainder only rests after
/// the opposing side has been exhausted up to the limit, the book is never left crossed.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    /// The order book this engine is managing
    order_book: OrderBook,

    /// Totals across processed orders
    stats: EngineStats,
}

impl MatchingEngine {
    /// Creates a new matching engine with an empty book.
    #[inline]
    pub fn new() -> Self {
        Self {
            order_book: OrderBook::new(),
            stats: EngineStats::default(),
        }
    }

    /// Processes an incoming order against the book.
    ///
    /// On return the order has been fully handled: `order.quantity` holds the quantity that was
    /// left after matching, and that quantity has already been rested. Callers must not resubmit it.
    ///
    /// The order's quantity is trusted to be strictly positive and is not validated. A
    /// zero-quantity order is counted as processed and leaves the book untouched.
    pub fn process(&mut self, order: &mut Order) -> MatchResult {
        if order.quantity == 0 {
            self.stats.orders_processed += 1;
            return MatchResult {
                order_id: order.id,
                ..MatchResult::default()
            };
        }

        let result = match order.side {
            Side::Buy => self.match_buy(order),
            Side::Sell => self.match_sell(order),
        };

        self.stats.orders_processed += 1;
        self.stats.fills += result.fills.len() as u64;
        self.stats.matched_volume += result.matched;
        if result.is_fully_filled() {
            self.stats.orders_fully_filled += 1;
        } else {
            self.stats.orders_rested += 1;
        }

        result
    }

    /// Matches a buy against the ask side, lowest price first, then rests any remainder as a bid.
    pub fn match_buy(&mut self, order: &mut Order) -> MatchResult {
        let mut result = self.sweep(order, Side::Sell);
        if order.quantity > 0 {
            self.order_book.add_to_book(order.price, order.quantity, Side::Buy);
            result.rested = order.quantity;
        }
        result
    }

    /// Matches a sell against the bid side, highest price first, then rests any remainder as an ask.
    pub fn match_sell(&mut self, order: &mut Order) -> MatchResult {
        let mut result = self.sweep(order, Side::Buy);
        if order.quantity > 0 {
            self.order_book.add_to_book(order.price, order.quantity, Side::Sell);
            result.rested = order.quantity;
        }
        result
    }

    /// Consumes marketable levels on `resting` until the order is filled or the best level no
    /// longer crosses the order's limit.
    #[inline(always)]
    fn sweep(&mut self, order: &mut Order, resting: Side) -> MatchResult {
        let mut result = MatchResult {
            order_id: order.id,
            ..MatchResult::default()
        };

        while order.quantity > 0 {
            let Some((price, taken)) = self.order_book.take_best(resting, order.price, order.quantity) else {
                break;
            };
            order.quantity -= taken;
            result.matched += taken;
            result.fills.push(Fill { price, quantity: taken });
        }

        result
    }

    /// Best bid and best ask.
    #[inline]
    pub fn top_of_book(&self) -> TopOfBook {
        self.order_book.top_of_book()
    }

    /// Gets a snapshot of the best `limit` levels per side.
    pub fn depth(&self, limit: usize) -> DepthSnapshot {
        self.order_book.depth(limit)
    }

    /// Gets the current state of the order book.
    pub fn order_book(&self) -> &OrderBook {
        &self.order_book
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::orderbook::PriceLevel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    /// Creates a limit order stamped now with a fresh id.
    fn create_test_order(side: Side, price: Price, quantity: Quantity) -> Order {
        Order::new(NEXT_ID.fetch_add(1, Ordering::Relaxed), side, price, quantity, Instant::now())
    }

    fn process(engine: &mut MatchingEngine, side: Side, price: Price, quantity: Quantity) -> MatchResult {
        let mut order = create_test_order(side, price, quantity);
        engine.process(&mut order)
    }

    /// An order on an empty book rests entirely.
    #[test]
    fn test_buy_rests_on_empty_book() {
        let mut engine = MatchingEngine::new();
        let result = process(&mut engine, Side::Buy, 100, 10);

        assert!(result.fills.is_empty());
        assert_eq!(result.rested, 10);
        assert_eq!(engine.order_book().volume_at(Side::Buy, 100), Some(10));
        assert_eq!(engine.order_book().level_count(Side::Sell), 0);
    }

    /// A sell priced below the resting bid executes at the bid level.
    #[test]
    fn test_sell_fills_against_better_bid() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Buy, 100, 10);

        let mut sell = create_test_order(Side::Sell, 99, 4);
        let result = engine.process(&mut sell);

        assert_eq!(result.fills, vec![Fill { price: 100, quantity: 4 }]);
        assert_eq!(result.matched, 4);
        assert_eq!(result.rested, 0);
        assert_eq!(sell.quantity, 0);
        assert_eq!(engine.order_book().volume_at(Side::Buy, 100), Some(6));
        assert_eq!(engine.order_book().level_count(Side::Sell), 0);
    }

    /// A buy sweeps two ask levels in price order and rests the remainder.
    #[test]
    fn test_buy_sweeps_levels_then_rests() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Sell, 101, 5);
        process(&mut engine, Side::Sell, 102, 5);

        let result = process(&mut engine, Side::Buy, 102, 12);

        assert_eq!(
            result.fills,
            vec![Fill { price: 101, quantity: 5 }, Fill { price: 102, quantity: 5 }]
        );
        assert_eq!(result.matched, 10);
        assert_eq!(result.rested, 2);
        assert_eq!(engine.order_book().level_count(Side::Sell), 0);
        assert_eq!(engine.order_book().volume_at(Side::Buy, 102), Some(2));
        assert_eq!(engine.order_book().level_count(Side::Buy), 1);
    }

    /// Two buys at one price with nothing to match aggregate into one level.
    #[test]
    fn test_same_price_orders_aggregate() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Buy, 100, 3);
        process(&mut engine, Side::Buy, 100, 2);

        assert_eq!(engine.order_book().level_count(Side::Buy), 1);
        assert_eq!(engine.order_book().volume_at(Side::Buy, 100), Some(5));
    }

    /// Scanning stops at the first ask above the buy limit.
    #[test]
    fn test_buy_stops_at_limit() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Sell, 100, 2);
        process(&mut engine, Side::Sell, 103, 2);

        let result = process(&mut engine, Side::Buy, 101, 5);

        assert_eq!(result.fills, vec![Fill { price: 100, quantity: 2 }]);
        assert_eq!(result.rested, 3);
        assert_eq!(
            engine.top_of_book(),
            TopOfBook {
                bid: Some(PriceLevel::new(101, 3)),
                ask: Some(PriceLevel::new(103, 2)),
            }
        );
    }

    /// A sell that exactly exhausts a bid level leaves no residual level and does not rest.
    #[test]
    fn test_exact_fill_removes_level() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Buy, 100, 7);

        let result = process(&mut engine, Side::Sell, 100, 7);

        assert!(result.is_fully_filled());
        assert!(engine.order_book().is_empty());
    }

    /// A fully absorbed order never creates a level on its own side.
    #[test]
    fn test_fully_matched_order_does_not_touch_own_side() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Sell, 99, 10);

        process(&mut engine, Side::Buy, 105, 4);

        assert_eq!(engine.order_book().level_count(Side::Buy), 0);
        assert_eq!(engine.order_book().volume_at(Side::Sell, 99), Some(6));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Sell, 101, 5);
        process(&mut engine, Side::Sell, 102, 5);
        process(&mut engine, Side::Buy, 102, 12);
        process(&mut engine, Side::Sell, 90, 1);

        let stats = engine.stats();
        assert_eq!(stats.orders_processed, 4);
        assert_eq!(stats.orders_fully_filled, 1);
        assert_eq!(stats.orders_rested, 3);
        assert_eq!(stats.fills, 3);
        assert_eq!(stats.matched_volume, 11);
    }

    /// Drives a seeded random stream through the engine and checks level positivity, the
    /// uncrossed book and per-order quantity conservation after every call.
    #[test]
    fn test_random_flow_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut engine = MatchingEngine::new();

        for _ in 0..5_000 {
            let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let price = rng.gen_range(95..=105);
            let quantity = rng.gen_range(1..=10);
            let mut order = create_test_order(side, price, quantity);

            let result = engine.process(&mut order);

            assert_eq!(result.matched + result.rested, quantity);
            assert_eq!(result.fills.iter().map(|f| f.quantity).sum::<Quantity>(), result.matched);
            assert!(result.fills.iter().all(|f| f.quantity > 0));
            assert_eq!(order.quantity, result.rested);

            let depth = engine.depth(usize::MAX);
            assert!(depth.bids.iter().chain(depth.asks.iter()).all(|level| level.quantity > 0));
            assert!(!engine.top_of_book().is_crossed());
        }
    }

    /// A zero-quantity order neither fills nor rests, on either side of the book.
    #[test]
    fn test_zero_quantity_order_is_a_no_op() {
        let mut engine = MatchingEngine::new();
        process(&mut engine, Side::Sell, 101, 5);

        for side in [Side::Buy, Side::Sell] {
            let result = process(&mut engine, side, 101, 0);
            assert!(result.fills.is_empty());
            assert_eq!((result.matched, result.rested), (0, 0));
        }

        assert_eq!(engine.order_book().volume_at(Side::Sell, 101), Some(5));
        assert_eq!(engine.order_book().bid_levels(), 0);
        let stats = engine.stats();
        assert_eq!(stats.orders_processed, 3);
        assert_eq!(stats.orders_fully_filled + stats.orders_rested, 1);
    }
}
