use crate::data::Bar;
use crate::engines::evaluation::simulator::MarketSimulator;
use crate::error::{Result, TradegeneError};
use crate::types::{Fill, Market, OrderAmount, Side};
use std::collections::HashMap;

pub const DEFAULT_FEE_RATE: f64 = 0.0025;

// Tolerance for spending "everything" after float rounding
const BALANCE_EPSILON: f64 = 1e-9;

/// Starting conditions for a fresh ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub quote: String,
    pub starting_balance: f64,
    pub fee_rate: f64,
}

impl Wallet {
    pub fn new(quote: impl Into<String>, starting_balance: f64, fee_rate: f64) -> Self {
        Self {
            quote: quote.into(),
            starting_balance,
            fee_rate,
        }
    }

    pub fn ledger(&self) -> Ledger {
        let mut ledger = Ledger::new(self.fee_rate);
        ledger.balances.insert(self.quote.clone(), self.starting_balance);
        ledger
    }
}

/// Paper trading account: balances plus fill history
#[derive(Debug, Clone)]
pub struct Ledger {
    balances: HashMap<String, f64>,
    fills: Vec<Fill>,
    fee_rate: f64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_RATE)
    }
}

impl Ledger {
    pub fn new(fee_rate: f64) -> Self {
        Self {
            balances: HashMap::new(),
            fills: Vec::new(),
            fee_rate,
        }
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn available(&self, symbol: &str) -> f64 {
        self.balances.get(symbol).copied().unwrap_or(0.0)
    }

    fn debit(&mut self, symbol: &str, amount: f64) -> Result<()> {
        let available = self.available(symbol);
        if amount > available + BALANCE_EPSILON {
            return Err(TradegeneError::Simulation(format!(
                "Insufficient {} balance: need {}, have {}",
                symbol, amount, available
            )));
        }
        self.balances.insert(symbol.to_string(), (available - amount).max(0.0));
        Ok(())
    }

    fn credit(&mut self, symbol: &str, amount: f64) {
        *self.balances.entry(symbol.to_string()).or_insert(0.0) += amount;
    }
}

impl MarketSimulator for Ledger {
    fn balance(&mut self, symbol: &str) -> f64 {
        *self.balances.entry(symbol.to_string()).or_insert(0.0)
    }

    fn trades(&self, market: &Market) -> Vec<&Fill> {
        let name = market.to_string();
        self.fills.iter().rev().filter(|fill| fill.market == name).collect()
    }

    fn place_order(&mut self, market: &Market, side: Side, amount: OrderAmount, bar: &Bar<'_>) -> Result<Fill> {
        let price = bar.close;
        if !price.is_finite() || price <= 0.0 {
            return Err(TradegeneError::Simulation(format!(
                "Cannot fill {} at price {}",
                market, price
            )));
        }

        let requested = match amount {
            OrderAmount::Base(value) | OrderAmount::Quote(value) => value,
        };
        if !requested.is_finite() || requested <= 0.0 {
            return Err(TradegeneError::Simulation(format!(
                "Order size must be positive, got {}",
                requested
            )));
        }

        // Fees are always charged on the quote leg
        let (base_amount, fee) = match side {
            Side::Buy => {
                let spend = match amount {
                    OrderAmount::Quote(quote) => quote,
                    OrderAmount::Base(base) => base * price / (1.0 - self.fee_rate),
                };
                let fee = spend * self.fee_rate;
                let base_amount = (spend - fee) / price;

                self.debit(&market.quote, spend)?;
                self.credit(&market.symbol, base_amount);
                (base_amount, fee)
            }
            Side::Sell => {
                let base_amount = match amount {
                    OrderAmount::Base(base) => base,
                    OrderAmount::Quote(quote) => quote / price,
                };
                let gross = base_amount * price;
                let fee = gross * self.fee_rate;

                self.debit(&market.symbol, base_amount)?;
                self.credit(&market.quote, gross - fee);
                (base_amount, fee)
            }
        };

        let fill = Fill {
            market: market.to_string(),
            side,
            price,
            amount: base_amount,
            fee,
            timestamp: bar.timestamp,
        };
        self.fills.push(fill.clone());
        Ok(fill)
    }

    fn net_worth(&self, market: &Market, close: f64) -> f64 {
        close * self.available(&market.symbol) + self.available(&market.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64, features: &[f64]) -> Bar<'_> {
        Bar {
            timestamp: 0,
            close,
            features,
        }
    }

    #[test]
    fn test_unknown_symbol_is_provisioned() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.balance("XYZ"), 0.0);
        assert_eq!(ledger.available("XYZ"), 0.0);
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let market = Market::parse("ETH-EUR").unwrap();
        let mut ledger = Wallet::new("EUR", 100.0, DEFAULT_FEE_RATE).ledger();
        let row = [0.0];
        let result = ledger.place_order(&market, Side::Buy, OrderAmount::Quote(100.0), &bar(0.0, &row));
        assert!(result.is_err());
        assert_eq!(ledger.available("EUR"), 100.0);
        assert!(ledger.fills().is_empty());
    }
}
