use crate::data::Bar;
use crate::error::Result;
use crate::types::{Fill, Market, OrderAmount, Side};

/// Order-level view of a simulated exchange account
///
/// The shared time cursor lives in [`MarketFeed`](crate::data::MarketFeed);
/// implementations only keep balances and fills and price every order at the
/// close of the bar they are handed.
pub trait MarketSimulator {
    /// Available amount; unknown symbols are provisioned with zero
    fn balance(&mut self, symbol: &str) -> f64;

    /// Past fills for `market`, most recent first
    fn trades(&self, market: &Market) -> Vec<&Fill>;

    fn place_order(&mut self, market: &Market, side: Side, amount: OrderAmount, bar: &Bar<'_>) -> Result<Fill>;

    /// `close * base balance + quote balance`
    fn net_worth(&self, market: &Market, close: f64) -> f64;

    /// Price of the most recent buy, or 0 when there is none
    fn last_buy_price(&self, market: &Market) -> f64 {
        self.trades(market)
            .into_iter()
            .find(|fill| fill.side == Side::Buy)
            .map(|fill| fill.price)
            .unwrap_or(0.0)
    }
}
