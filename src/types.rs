use crate::error::{Result, TradegeneError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pair such as `ETH-EUR`: base symbol first, quote currency second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    pub symbol: String,
    pub quote: String,
}

impl Market {
    pub fn parse(market: &str) -> Result<Self> {
        match market.split_once('-') {
            Some((symbol, quote)) if !symbol.is_empty() && !quote.is_empty() && !quote.contains('-') => {
                Ok(Self {
                    symbol: symbol.to_string(),
                    quote: quote.to_string(),
                })
            }
            _ => Err(TradegeneError::Configuration(format!(
                "Market must look like SYMBOL-QUOTE, got '{}'",
                market
            ))),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.symbol, self.quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Market order size: either a base-currency amount or a quote-currency amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderAmount {
    Base(f64),
    Quote(f64),
}

/// A filled paper trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub market: String,
    pub side: Side,
    pub price: f64,
    pub amount: f64,
    pub fee: f64,
    pub timestamp: i64, // bar open time, milliseconds
}
