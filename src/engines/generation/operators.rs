use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Anything that carries a fitness score
pub trait Scored {
    fn fitness(&self) -> f64;
}

impl Scored for f64 {
    fn fitness(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Best,
    Worst,
}

/// Truncation selection. Returns indices of the `k` highest (`Best`) or
/// lowest (`Worst`) scored members in ascending fitness order; ties keep their
/// original relative order. Empty if `k` exceeds the population.
pub fn select_deterministic<T: Scored>(population: &[T], k: usize, mode: SelectionMode) -> Vec<usize> {
    if k > population.len() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| population[a].fitness().total_cmp(&population[b].fitness()));

    match mode {
        SelectionMode::Best => order[population.len() - k..].to_vec(),
        SelectionMode::Worst => order[..k].to_vec(),
    }
}

/// Sampling weights: `fitness / n` for `Best`, `n / fitness` for `Worst`
/// (zero fitness gets zero weight). Negative and non-finite weights count as zero.
pub fn selection_weights<T: Scored>(population: &[T], mode: SelectionMode) -> Vec<f64> {
    let n = population.len() as f64;
    population
        .iter()
        .map(|member| {
            let fitness = member.fitness();
            let weight = match mode {
                SelectionMode::Best => fitness / n,
                SelectionMode::Worst if fitness == 0.0 => 0.0,
                SelectionMode::Worst => n / fitness,
            };
            if weight.is_finite() && weight > 0.0 {
                weight
            } else {
                0.0
            }
        })
        .collect()
}

/// Roulette wheel selection with replacement: `k` independent weighted draws
pub fn select_weighted<T: Scored, R: Rng>(
    population: &[T],
    k: usize,
    mode: SelectionMode,
    rng: &mut R,
) -> Vec<usize> {
    if population.is_empty() {
        return Vec::new();
    }

    let weights = selection_weights(population, mode);
    match WeightedIndex::new(&weights) {
        Ok(wheel) => (0..k).map(|_| wheel.sample(rng)).collect(),
        // All weights zero, pick random
        Err(_) => (0..k).map(|_| rng.gen_range(0..population.len())).collect(),
    }
}
