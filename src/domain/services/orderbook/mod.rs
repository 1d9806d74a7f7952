pub mod orderbook;
pub mod depth;

pub use self::orderbook::OrderBook;
pub use self::depth::{DepthSnapshot, PriceLevel, TopOfBook};
