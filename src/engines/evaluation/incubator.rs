use crate::config::{ConfigSection, EvolutionConfig, SimulationConfig, StorageConfig};
use crate::data::snapshot::{self, SnapshotKey};
use crate::data::{Bar, MarketFeed, PriceHistory};
use crate::engines::evaluation::ledger::Wallet;
use crate::engines::evaluation::progress::ProgressCallback;
use crate::engines::evaluation::signals::{trade_bar, Strategy};
use crate::engines::evaluation::simulator::MarketSimulator;
use crate::engines::generation::{Individual, Population};
use crate::error::{Result, TradegeneError};
use crate::types::Market;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decoded rules of the fittest individual
#[derive(Debug, Clone, PartialEq)]
pub struct BestStrategy {
    pub strategy: Strategy,
    pub fitness: f64,
}

/// Runs generations of the population against price windows and keeps the
/// population snapshot on disk in step with memory.
pub struct Incubator {
    evolution: EvolutionConfig,
    simulation: SimulationConfig,
    market: Market,
    wallet: Wallet,
    key: SnapshotKey,
    snapshot_path: PathBuf,
    population: Population,
    rng: StdRng,
    pool: Option<rayon::ThreadPool>,
    stop: Arc<AtomicBool>,
    generation: usize,
}

impl Incubator {
    /// Restore the population for this configuration, or create and persist
    /// a random one when no snapshot exists yet.
    pub fn new(
        evolution: EvolutionConfig,
        simulation: SimulationConfig,
        storage: &StorageConfig,
    ) -> Result<Self> {
        evolution.validate()?;
        simulation.validate()?;
        storage.validate()?;

        let market = simulation.market()?;
        let wallet = simulation.wallet()?;
        let key = SnapshotKey {
            market: market.to_string(),
            interval: simulation.interval.clone(),
            window_size: evolution.window_size,
            population_size: evolution.population_size,
            gene_size: evolution.gene_size,
        };
        let snapshot_path = key.path_in(&storage.data_dir);

        let mut rng = match evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let population = match snapshot::load(&snapshot_path, &key)? {
            Some(individuals) => {
                info!(
                    "Restored {} individuals from {}",
                    individuals.len(),
                    snapshot_path.display()
                );
                let mut population = Population::from_individuals(
                    individuals,
                    evolution.population_size,
                    evolution.gene_size,
                )?;
                for individual in population.individuals_mut() {
                    individual.reset(&wallet);
                }
                population
            }
            None => {
                let population = Population::random(
                    evolution.population_size,
                    evolution.gene_size,
                    &wallet,
                    &mut rng,
                )?;
                snapshot::save(&snapshot_path, &key, population.individuals())?;
                info!(
                    "Created random population of {} at {}",
                    population.len(),
                    snapshot_path.display()
                );
                population
            }
        };

        let pool = match evolution.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        TradegeneError::Configuration(format!("Failed to build thread pool: {}", e))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            evolution,
            simulation,
            market,
            wallet,
            key,
            snapshot_path,
            population,
            rng,
            pool,
            stop: Arc::new(AtomicBool::new(false)),
            generation: 0,
        })
    }

    /// Setting the flag interrupts the running generation at the next bar
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn evolution_config(&self) -> &EvolutionConfig {
        &self.evolution
    }

    pub fn simulation_config(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Generations completed since construction
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best individual of the current population, decoded
    pub fn best_strategy(&self) -> Option<BestStrategy> {
        self.population.best().map(|individual| BestStrategy {
            strategy: individual.strategy(),
            fitness: individual.fitness,
        })
    }

    /// Run one generation over `window`: trade every bar, score, breed and
    /// persist. Returns the best individual as scored on this window.
    pub fn run_generation<C: ProgressCallback>(
        &mut self,
        window: &PriceHistory,
        callback: &mut C,
    ) -> Result<BestStrategy> {
        if window.is_empty() {
            return Err(TradegeneError::Simulation(
                "Cannot run a generation on an empty window".to_string(),
            ));
        }
        callback.on_generation_start(self.generation);

        for individual in self.population.individuals_mut() {
            individual.reset(&self.wallet);
        }
        // Genes do not change within a generation
        let strategies: Vec<Strategy> = self
            .population
            .individuals()
            .iter()
            .map(Individual::strategy)
            .collect();

        let mut feed = MarketFeed::new(window, self.evolution.stride);
        let mut last_close = None;
        while feed.step() {
            if self.stop.load(Ordering::SeqCst) {
                warn!("Generation {} interrupted", self.generation + 1);
                return Err(TradegeneError::Interrupted {
                    generation: self.generation,
                });
            }
            let (Some(bar), Some(position)) = (feed.current_bar(), feed.position()) else {
                break;
            };

            let market = &self.market;
            let min_trade_quote = self.simulation.min_trade_quote;
            let individuals = self.population.individuals_mut();
            let mut evaluate = || {
                individuals
                    .par_iter_mut()
                    .zip(strategies.par_iter())
                    .for_each(|(individual, strategy)| {
                        step_individual(individual, strategy, market, &bar, min_trade_quote)
                    })
            };
            match &self.pool {
                Some(pool) => pool.install(evaluate),
                None => evaluate(),
            }

            last_close = Some(bar.close);
            callback.on_bar(position, feed.len());
        }

        let close = last_close.unwrap_or(0.0);
        for individual in self.population.individuals_mut() {
            let worth = individual.ledger.net_worth(&self.market, close);
            individual.fitness = if worth.is_finite() { worth.max(0.0) } else { 0.0 };
        }
        self.population.penalize_passives(self.wallet.starting_balance);

        let best = self.best_strategy().ok_or_else(|| {
            TradegeneError::Simulation("Population is empty after scoring".to_string())
        })?;
        let faulted = self
            .population
            .individuals()
            .iter()
            .filter(|individual| individual.faulted)
            .count();
        if faulted > 0 {
            warn!("{} individuals stopped trading after simulator errors", faulted);
        }

        self.population
            .breed(self.evolution.mutation_rate, &self.wallet, &mut self.rng);
        snapshot::save(&self.snapshot_path, &self.key, self.population.individuals())?;

        info!(
            "Generation {} on {} bars: best fitness {:.2}",
            self.generation + 1,
            window.len(),
            best.fitness
        );
        callback.on_generation_complete(self.generation, best.fitness);
        self.generation += 1;
        Ok(best)
    }

    /// Run `generations` consecutive generations on the same window
    pub fn incubate<C: ProgressCallback>(
        &mut self,
        window: &PriceHistory,
        generations: usize,
        callback: &mut C,
    ) -> Result<BestStrategy> {
        let mut best = None;
        for _ in 0..generations {
            best = Some(self.run_generation(window, callback)?);
        }
        match best {
            Some(best) => Ok(best),
            None => self.best_strategy().ok_or_else(|| {
                TradegeneError::Simulation("Population is empty".to_string())
            }),
        }
    }
}

/// One bar for one individual. A simulator error parks the individual for
/// the rest of the generation with whatever its ledger holds.
fn step_individual(
    individual: &mut Individual,
    strategy: &Strategy,
    market: &Market,
    bar: &Bar<'_>,
    min_trade_quote: f64,
) {
    if individual.faulted {
        return;
    }
    match trade_bar(&mut individual.ledger, strategy, market, bar, min_trade_quote) {
        Ok(Some(fill)) => debug!(
            "{} {:?} {:.6} @ {:.2} at {}",
            fill.market,
            fill.side,
            fill.amount,
            fill.price,
            bar.time()
        ),
        Ok(None) => {}
        Err(e) => {
            warn!("Simulator error at {}: {}", bar.time(), e);
            individual.faulted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::progress::SilentProgress;

    fn configs(dir: &Path) -> (EvolutionConfig, SimulationConfig, StorageConfig) {
        let evolution = EvolutionConfig {
            population_size: 4,
            gene_size: 1,
            window_size: 5,
            seed: Some(11),
            threads: Some(2),
            ..EvolutionConfig::default()
        };
        let storage = StorageConfig {
            data_dir: dir.to_path_buf(),
        };
        (evolution, SimulationConfig::default(), storage)
    }

    fn rising(n: usize) -> PriceHistory {
        let rows: Vec<[f64; 6]> = (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                [i as f64 * 60_000.0, c, c, c, c, 1.0]
            })
            .collect();
        PriceHistory::from_candles(&rows)
    }

    #[test]
    fn test_new_creates_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (evolution, simulation, storage) = configs(dir.path());
        let incubator = Incubator::new(evolution, simulation, &storage).unwrap();
        assert!(incubator.snapshot_path().exists());
        assert_eq!(incubator.population().len(), 4);
        assert!(incubator.best_strategy().is_some());
    }

    #[test]
    fn test_incubate_counts_generations() {
        let dir = tempfile::tempdir().unwrap();
        let (evolution, simulation, storage) = configs(dir.path());
        let mut incubator = Incubator::new(evolution, simulation, &storage).unwrap();
        let best = incubator.incubate(&rising(5), 3, &mut SilentProgress).unwrap();
        assert_eq!(incubator.generation(), 3);
        assert!(best.fitness.is_finite());
    }

    #[test]
    fn test_empty_window_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (evolution, simulation, storage) = configs(dir.path());
        let mut incubator = Incubator::new(evolution, simulation, &storage).unwrap();
        let empty = PriceHistory::from_candles(&[]);
        assert!(incubator.run_generation(&empty, &mut SilentProgress).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut evolution, simulation, storage) = configs(dir.path());
        evolution.population_size = 1;
        assert!(Incubator::new(evolution, simulation, &storage).is_err());
    }
}
