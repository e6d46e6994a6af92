use crate::config::EvolutionConfig;
use crate::data::PriceHistory;
use crate::engines::evaluation::incubator::Incubator;
use crate::engines::evaluation::progress::ProgressCallback;
use crate::engines::evaluation::signals::trade_bar;
use crate::engines::evaluation::simulator::MarketSimulator;
use crate::error::{Result, TradegeneError};
use crate::types::Fill;
use log::{info, warn};
use std::fmt;

/// Outcome of a walk-forward paper run
#[derive(Debug, Clone)]
pub struct WalkForwardReport {
    pub windows: usize,
    pub fills: Vec<Fill>,
    pub starting_balance: f64,
    pub final_net_worth: f64,
    /// Buy-and-hold change from the first traded bar to the last, in percent
    pub market_return_pct: f64,
    pub strategy_return_pct: f64,
}

impl fmt::Display for WalkForwardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Windows:          {}", self.windows)?;
        writeln!(f, "Trades:           {}", self.fills.len())?;
        writeln!(f, "Final net worth:  {:.2}", self.final_net_worth)?;
        writeln!(f, "Market return:    {:.2}%", self.market_return_pct)?;
        write!(f, "Strategy return:  {:.2}%", self.strategy_return_pct)
    }
}

/// Slides a training window over the history. At each position the
/// population is incubated on the window, then the best strategy trades the
/// window's last bar on a separate paper ledger.
#[derive(Debug, Clone, Copy)]
pub struct WalkForward {
    pub window_size: usize,
    pub step: usize,
    pub generations_per_window: usize,
}

impl WalkForward {
    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self {
            window_size: config.window_size,
            step: config.walk_forward_step,
            generations_per_window: config.generations_per_window,
        }
    }

    pub fn run<C: ProgressCallback>(
        &self,
        incubator: &mut Incubator,
        history: &PriceHistory,
        callback: &mut C,
    ) -> Result<WalkForwardReport> {
        if self.window_size == 0 || self.step == 0 {
            return Err(TradegeneError::Configuration(
                "Walk-forward window and step must be positive".to_string(),
            ));
        }
        if history.len() < self.window_size {
            return Err(TradegeneError::DataLoading(format!(
                "History has {} bars, a window needs {}",
                history.len(),
                self.window_size
            )));
        }

        let market = incubator.market().clone();
        let min_trade_quote = incubator.simulation_config().min_trade_quote;
        let starting_balance = incubator.wallet().starting_balance;
        let mut paper = incubator.wallet().ledger();

        let mut windows = 0;
        let mut first_close = None;
        let mut last_close = 0.0;
        for end in (self.window_size..=history.len()).step_by(self.step) {
            let window = history.window(end - self.window_size, self.window_size);
            let best = incubator.incubate(&window, self.generations_per_window, callback)?;
            let Some(bar) = window.last_bar() else {
                continue;
            };

            match trade_bar(&mut paper, &best.strategy, &market, &bar, min_trade_quote) {
                Ok(Some(fill)) => info!(
                    "{} {:?} {:.6} {} @ {:.2}",
                    bar.time(),
                    fill.side,
                    fill.amount,
                    market.symbol,
                    fill.price
                ),
                Ok(None) => {}
                Err(e) => warn!("Paper order rejected at {}: {}", bar.time(), e),
            }

            first_close.get_or_insert(bar.close);
            last_close = bar.close;
            windows += 1;
        }

        let final_net_worth = paper.net_worth(&market, last_close);
        let market_return_pct = match first_close {
            Some(first) if first > 0.0 => (last_close / first - 1.0) * 100.0,
            _ => 0.0,
        };

        Ok(WalkForwardReport {
            windows,
            fills: paper.fills().to_vec(),
            starting_balance,
            final_net_worth,
            market_return_pct,
            strategy_return_pct: (final_net_worth / starting_balance - 1.0) * 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimulationConfig, StorageConfig};
    use crate::engines::evaluation::progress::SilentProgress;

    fn history(closes: &[f64]) -> PriceHistory {
        let rows: Vec<[f64; 6]> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| [i as f64 * 60_000.0, c, c, c, c, 1.0])
            .collect();
        PriceHistory::from_candles(&rows)
    }

    fn incubator(dir: &std::path::Path, window_size: usize) -> Incubator {
        let evolution = EvolutionConfig {
            population_size: 4,
            gene_size: 1,
            window_size,
            generations_per_window: 1,
            walk_forward_step: 2,
            seed: Some(5),
            ..EvolutionConfig::default()
        };
        let storage = StorageConfig {
            data_dir: dir.to_path_buf(),
        };
        Incubator::new(evolution, SimulationConfig::default(), &storage).unwrap()
    }

    #[test]
    fn test_window_count_and_market_return() {
        let dir = tempfile::tempdir().unwrap();
        let mut incubator = incubator(dir.path(), 3);
        let walk = WalkForward::from_config(incubator.evolution_config());

        // windows end at bars 3, 5 and 7
        let closes = [100.0, 100.0, 100.0, 101.0, 102.0, 103.0, 110.0];
        let report = walk.run(&mut incubator, &history(&closes), &mut SilentProgress).unwrap();

        assert_eq!(report.windows, 3);
        assert!((report.market_return_pct - 10.0).abs() < 1e-9);
        assert!(report.final_net_worth.is_finite());
        assert_eq!(incubator.generation(), 3);
    }

    #[test]
    fn test_short_history_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut incubator = incubator(dir.path(), 5);
        let walk = WalkForward::from_config(incubator.evolution_config());
        assert!(walk
            .run(&mut incubator, &history(&[100.0, 101.0]), &mut SilentProgress)
            .is_err());
    }
}
