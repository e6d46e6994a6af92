use crate::data::Bar;
use crate::engines::evaluation::simulator::MarketSimulator;
use crate::engines::generation::{decode, DecisionRule, Gene};
use crate::error::Result;
use crate::types::{Fill, Market, OrderAmount, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Account state the signal logic looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountView {
    pub position: f64,
    pub quote: f64,
    pub last_buy_price: f64,
}

/// Decoded buy and sell rules of one individual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub buy: DecisionRule,
    pub sell: DecisionRule,
}

impl Strategy {
    pub fn from_genes(buy: &Gene, sell: &Gene) -> Self {
        Self {
            buy: decode(buy),
            sell: decode(sell),
        }
    }

    /// Stop-loss comes from the sell gene
    pub fn stop_loss(&self) -> f64 {
        self.sell.stop_loss
    }

    /// Both rules are evaluated on every bar. Buying needs a flat position and
    /// more than `min_trade_quote` cash; selling needs a position and either
    /// the stop-loss or the sell rule. Buy wins when both fire.
    pub fn signal(&self, bar: &Bar<'_>, account: &AccountView, min_trade_quote: f64) -> Signal {
        let buy_rule = self.buy.evaluate(bar.features);
        let sell_rule = self.sell.evaluate(bar.features);

        let flat = account.position == 0.0;
        let buy = buy_rule & flat & (account.quote > min_trade_quote);
        let stopped_out = account.last_buy_price * self.stop_loss() > bar.close;
        let sell = !flat & (stopped_out | sell_rule);

        match (buy, sell) {
            (true, _) => Signal::Buy,
            (false, true) => Signal::Sell,
            (false, false) => Signal::Hold,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buy: {}\nsell: {}", self.buy.expr, self.sell.expr)?;
        write!(f, "\nstop-loss: {:.2}", self.stop_loss())
    }
}

/// Decide for one bar and place the resulting order, if any. Buys spend the
/// whole quote balance; sells close the whole position.
pub fn trade_bar<S: MarketSimulator>(
    simulator: &mut S,
    strategy: &Strategy,
    market: &Market,
    bar: &Bar<'_>,
    min_trade_quote: f64,
) -> Result<Option<Fill>> {
    let account = AccountView {
        position: simulator.balance(&market.symbol),
        quote: simulator.balance(&market.quote),
        last_buy_price: simulator.last_buy_price(market),
    };

    match strategy.signal(bar, &account, min_trade_quote) {
        Signal::Buy => simulator
            .place_order(market, Side::Buy, OrderAmount::Quote(account.quote), bar)
            .map(Some),
        Signal::Sell => simulator
            .place_order(market, Side::Sell, OrderAmount::Base(account.position), bar)
            .map(Some),
        Signal::Hold => Ok(None),
    }
}
