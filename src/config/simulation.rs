use super::traits::ConfigSection;
use crate::engines::evaluation::ledger::{Wallet, DEFAULT_FEE_RATE};
use crate::error::TradegeneError;
use crate::types::Market;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub market: String,
    pub interval: String,
    /// Quote currency every ledger starts with
    pub starting_balance: f64,
    pub fee_rate: f64,
    /// Buys need strictly more quote balance than this
    pub min_trade_quote: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            market: "ETH-EUR".to_string(),
            interval: "1h".to_string(),
            starting_balance: 1000.0,
            fee_rate: DEFAULT_FEE_RATE,
            min_trade_quote: 10.0,
        }
    }
}

impl SimulationConfig {
    pub fn market(&self) -> Result<Market, TradegeneError> {
        Market::parse(&self.market)
    }

    pub fn wallet(&self) -> Result<Wallet, TradegeneError> {
        Ok(Wallet::new(self.market()?.quote, self.starting_balance, self.fee_rate))
    }
}

impl ConfigSection for SimulationConfig {
    fn section_name() -> &'static str {
        "simulation"
    }

    fn validate(&self) -> Result<(), TradegeneError> {
        self.market()?;
        if self.interval.trim().is_empty() {
            return Err(TradegeneError::Configuration(
                "Interval must not be empty".to_string(),
            ));
        }
        if !self.starting_balance.is_finite() || self.starting_balance <= 0.0 {
            return Err(TradegeneError::Configuration(
                "Starting balance must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(TradegeneError::Configuration(
                "Fee rate must be in [0, 1)".to_string(),
            ));
        }
        if self.min_trade_quote < 0.0 {
            return Err(TradegeneError::Configuration(
                "Minimum trade size must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
