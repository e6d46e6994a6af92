use crate::engines::evaluation::ledger::{Ledger, Wallet};
use crate::engines::evaluation::signals::Strategy;
use crate::engines::generation::codec::RECORD_WIDTH;
use crate::engines::generation::genome::{mutate, new_gene, Gene};
use crate::engines::generation::operators::{
    select_deterministic, select_weighted, Scored, SelectionMode,
};
use crate::error::{Result, TradegeneError};
use log::{debug, warn};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One candidate strategy and the paper account it trades with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub buy: Gene,
    pub sell: Gene,
    pub fitness: f64,
    #[serde(skip)]
    pub ledger: Ledger,
    /// Set when the simulator rejected an order; the individual sits out the
    /// rest of the generation.
    #[serde(skip)]
    pub faulted: bool,
}

impl Individual {
    pub fn new(buy: Gene, sell: Gene, wallet: &Wallet) -> Self {
        Self {
            buy,
            sell,
            fitness: 0.0,
            ledger: wallet.ledger(),
            faulted: false,
        }
    }

    pub fn random<R: Rng>(gene_size: usize, wallet: &Wallet, rng: &mut R) -> Self {
        Self::new(new_gene(gene_size, rng), new_gene(gene_size, rng), wallet)
    }

    /// Fresh ledger; genes and fitness are kept
    pub fn reset(&mut self, wallet: &Wallet) {
        self.ledger = wallet.ledger();
        self.faulted = false;
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::from_genes(&self.buy, &self.sell)
    }
}

impl Scored for Individual {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// Fixed-size set of individuals
#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
    size: usize,
    gene_size: usize,
}

impl Population {
    fn validate_shape(size: usize, gene_size: usize) -> Result<()> {
        if size < 2 {
            return Err(TradegeneError::Configuration(format!(
                "Population size must be at least 2, got {}",
                size
            )));
        }
        if gene_size == 0 {
            return Err(TradegeneError::Configuration(
                "Gene size must be at least one record".to_string(),
            ));
        }
        Ok(())
    }

    pub fn random<R: Rng>(size: usize, gene_size: usize, wallet: &Wallet, rng: &mut R) -> Result<Self> {
        Self::validate_shape(size, gene_size)?;
        Ok(Self {
            individuals: (0..size)
                .map(|_| Individual::random(gene_size, wallet, rng))
                .collect(),
            size,
            gene_size,
        })
    }

    /// Wrap restored individuals, checking count and gene lengths
    pub fn from_individuals(individuals: Vec<Individual>, size: usize, gene_size: usize) -> Result<Self> {
        Self::validate_shape(size, gene_size)?;
        if individuals.len() != size {
            return Err(TradegeneError::Configuration(format!(
                "Expected {} individuals, got {}",
                size,
                individuals.len()
            )));
        }
        let gene_len = gene_size * RECORD_WIDTH;
        if let Some(i) = individuals
            .iter()
            .position(|ind| ind.buy.len() != gene_len || ind.sell.len() != gene_len)
        {
            return Err(TradegeneError::Configuration(format!(
                "Individual {} has genes of {}/{} bits, expected {}",
                i,
                individuals[i].buy.len(),
                individuals[i].sell.len(),
                gene_len
            )));
        }
        Ok(Self {
            individuals,
            size,
            gene_size,
        })
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Target size `N`
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn gene_size(&self) -> usize {
        self.gene_size
    }

    pub fn best(&self) -> Option<&Individual> {
        select_deterministic(&self.individuals, 1, SelectionMode::Best)
            .first()
            .map(|&i| &self.individuals[i])
    }

    /// Halve the fitness of every individual that ended exactly at the
    /// starting wallet. A strategy that traded back to break-even is
    /// indistinguishable here and is halved as well.
    pub fn penalize_passives(&mut self, baseline: f64) {
        for individual in &mut self.individuals {
            if individual.fitness == baseline {
                individual.fitness = baseline / 2.0;
            }
        }
    }

    /// Replace the worst quarter with offspring of a fitness-weighted parent
    /// pool. Survivors keep their fitness; offspring start at zero. Every
    /// ledger is reset to `wallet`.
    pub fn breed<R: Rng>(&mut self, mutation_rate: f64, wallet: &Wallet, rng: &mut R) {
        let quarter = self.size / 4;
        let cull_size = quarter.max(1).min(self.individuals.len().saturating_sub(1));
        let pool_size = quarter.max(2);

        let mut culled = select_deterministic(&self.individuals, cull_size, SelectionMode::Worst);
        culled.sort_unstable_by(|a, b| b.cmp(a));
        for i in culled {
            self.individuals.remove(i);
        }

        let pool: Vec<(Gene, Gene)> = select_weighted(&self.individuals, pool_size, SelectionMode::Best, rng)
            .into_iter()
            .map(|i| (self.individuals[i].buy.clone(), self.individuals[i].sell.clone()))
            .collect();

        let mut bred = 0usize;
        let mut spawned = 0usize;
        while self.individuals.len() < self.size {
            if pool.len() >= 2 {
                let parents = index::sample(rng, pool.len(), 2);
                let (mother, father) = (&pool[parents.index(0)], &pool[parents.index(1)]);
                let pairings = [
                    (&mother.0, &father.1),
                    (&father.0, &mother.1),
                    (&father.1, &mother.0),
                    (&mother.1, &father.0),
                ];
                for (buy, sell) in pairings {
                    if self.individuals.len() >= self.size {
                        break;
                    }
                    let child = Individual::new(
                        mutate(buy, mutation_rate, rng),
                        mutate(sell, mutation_rate, rng),
                        wallet,
                    );
                    self.individuals.push(child);
                    bred += 1;
                }
            }

            if self.individuals.len() < self.size {
                self.individuals.push(Individual::random(self.gene_size, wallet, rng));
                spawned += 1;
            }
        }

        self.trim_to_size(rng);

        for individual in &mut self.individuals {
            individual.reset(wallet);
        }
        debug!("Bred {} offspring and {} random individuals", bred, spawned);
    }

    /// Remove weighted-worst individuals one at a time until the population
    /// is back at its target size.
    pub fn trim_to_size<R: Rng>(&mut self, rng: &mut R) {
        while self.individuals.len() > self.size {
            warn!(
                "Overpopulation: {} individuals for a population of {}",
                self.individuals.len(),
                self.size
            );
            match select_weighted(&self.individuals, 1, SelectionMode::Worst, rng).first() {
                Some(&i) => {
                    self.individuals.remove(i);
                }
                None => break,
            }
        }
    }

    /// Append an individual, ignoring the target size
    #[doc(hidden)]
    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    /// Drop individuals down to `len`; `breed` refills to the target size
    #[doc(hidden)]
    pub fn truncate(&mut self, len: usize) {
        self.individuals.truncate(len);
    }
}
