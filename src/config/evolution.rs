use super::traits::ConfigSection;
use crate::error::TradegeneError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Clause records per gene
    pub gene_size: usize,
    pub mutation_rate: f64,
    /// Bars per training window
    pub window_size: usize,
    /// Bars advanced per simulation step
    pub stride: usize,
    /// Generations run on each window
    pub generations_per_window: usize,
    /// Bars the walk-forward run slides its window by
    pub walk_forward_step: usize,
    /// Worker threads for per-bar evaluation, `None` = rayon default
    pub threads: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 32,
            gene_size: 8,
            mutation_rate: 0.02,
            window_size: 1440,
            stride: 1,
            generations_per_window: 5,
            walk_forward_step: 1,
            threads: None,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), TradegeneError> {
        if self.population_size < 2 {
            return Err(TradegeneError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.gene_size == 0 {
            return Err(TradegeneError::Configuration(
                "Gene size must be at least one record".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(TradegeneError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if self.window_size == 0 || self.stride == 0 || self.walk_forward_step == 0 {
            return Err(TradegeneError::Configuration(
                "Window size, stride and walk-forward step must be positive".to_string(),
            ));
        }
        if self.generations_per_window == 0 {
            return Err(TradegeneError::Configuration(
                "At least one generation per window is required".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(TradegeneError::Configuration(
                "Thread count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
