use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use tradegene::config::{EvolutionConfig, SimulationConfig, StorageConfig};
use tradegene::data::snapshot::{self, SnapshotKey};
use tradegene::data::PriceHistory;
use tradegene::engines::evaluation::{Incubator, SilentProgress};
use tradegene::engines::generation::{
    encode, Clause, Combinator, Gene, Individual, Operand, Operator, Term, RECORD_WIDTH,
};
use tradegene::TradegeneError;

fn candles(closes: &[f64]) -> PriceHistory {
    let rows: Vec<[f64; 6]> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| [i as f64 * 3_600_000.0, c, c, c, c, 10.0])
        .collect();
    PriceHistory::from_candles(&rows)
}

fn flat_then_rising() -> PriceHistory {
    candles(&[100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 104.0, 106.0, 108.0, 110.0])
}

fn configs(dir: &Path, population_size: usize) -> (EvolutionConfig, SimulationConfig, StorageConfig) {
    let evolution = EvolutionConfig {
        population_size,
        gene_size: 1,
        window_size: 10,
        seed: Some(2024),
        ..EvolutionConfig::default()
    };
    let simulation = SimulationConfig {
        starting_balance: 1000.0,
        ..SimulationConfig::default()
    };
    let storage = StorageConfig {
        data_dir: dir.to_path_buf(),
    };
    (evolution, simulation, storage)
}

fn key_for(evolution: &EvolutionConfig, simulation: &SimulationConfig) -> SnapshotKey {
    SnapshotKey {
        market: simulation.market.clone(),
        interval: simulation.interval.clone(),
        window_size: evolution.window_size,
        population_size: evolution.population_size,
        gene_size: evolution.gene_size,
    }
}

fn always() -> Gene {
    let one = Term {
        operand: Operand::Literal(1),
        scale: None,
    };
    encode(&[Clause {
        left: one,
        operator: Operator::Eq,
        right: one,
        combinator: Combinator::Or,
        stop_loss_raw: 0,
    }])
}

fn never() -> Gene {
    Gene::from_bits(vec![false; RECORD_WIDTH])
}

#[test]
fn test_one_generation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (evolution, simulation, storage) = configs(dir.path(), 8);
    let key = key_for(&evolution, &simulation);

    let mut incubator = Incubator::new(evolution.clone(), simulation.clone(), &storage).unwrap();
    let best = incubator
        .run_generation(&flat_then_rising(), &mut SilentProgress)
        .unwrap();

    assert!(best.fitness.is_finite() && best.fitness >= 0.0);
    let population = incubator.population();
    assert_eq!(population.len(), 8);
    assert!(population
        .individuals()
        .iter()
        .all(|ind| ind.fitness.is_finite() && ind.fitness >= 0.0));

    let saved = snapshot::load(incubator.snapshot_path(), &key).unwrap().unwrap();
    assert_eq!(saved.len(), 8);
    for (saved, live) in saved.iter().zip(population.individuals()) {
        assert_eq!(saved.buy, live.buy);
        assert_eq!(saved.sell, live.sell);
        assert_eq!(saved.fitness, live.fitness);
    }

    // a new incubator picks up where this one left off
    let restored = Incubator::new(evolution, simulation, &storage).unwrap();
    for (a, b) in restored
        .population()
        .individuals()
        .iter()
        .zip(population.individuals())
    {
        assert_eq!(a.buy, b.buy);
        assert_eq!(a.fitness, b.fitness);
    }
}

#[test]
fn test_simulator_fault_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let (evolution, simulation, storage) = configs(dir.path(), 2);
    let key = key_for(&evolution, &simulation);
    let wallet = simulation.wallet().unwrap();

    // buys on the first bar, then the stop-loss fires into a zero price
    let trader = Individual::new(always(), never(), &wallet);
    let idle = Individual::new(never(), never(), &wallet);
    snapshot::save(&key.path_in(dir.path()), &key, &[trader, idle]).unwrap();

    let mut incubator = Incubator::new(evolution, simulation, &storage).unwrap();
    let best = incubator
        .run_generation(&candles(&[100.0, 0.0, 120.0]), &mut SilentProgress)
        .unwrap();

    // 1000 EUR less 0.25% fee, held through the fault and valued at 120
    let held = 997.5 / 100.0 * 120.0;
    assert!((best.fitness - held).abs() < 1e-6);
    assert_eq!(best.strategy.buy.stop_loss, 1.0);
    assert_eq!(incubator.population().len(), 2);
}

#[test]
fn test_interrupted_generation_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let (evolution, simulation, storage) = configs(dir.path(), 8);

    let mut incubator = Incubator::new(evolution, simulation, &storage).unwrap();
    let before = fs::read_to_string(incubator.snapshot_path()).unwrap();
    let fitness_before: Vec<f64> = incubator
        .population()
        .individuals()
        .iter()
        .map(|i| i.fitness)
        .collect();

    incubator.stop_handle().store(true, Ordering::SeqCst);
    let result = incubator.run_generation(&flat_then_rising(), &mut SilentProgress);

    assert!(matches!(
        result,
        Err(TradegeneError::Interrupted { generation: 0 })
    ));
    assert_eq!(fs::read_to_string(incubator.snapshot_path()).unwrap(), before);
    let fitness_after: Vec<f64> = incubator
        .population()
        .individuals()
        .iter()
        .map(|i| i.fitness)
        .collect();
    assert_eq!(fitness_after, fitness_before);
    assert_eq!(incubator.generation(), 0);
}

#[test]
fn test_snapshot_with_wrong_gene_length_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (evolution, simulation, storage) = configs(dir.path(), 2);
    let key = key_for(&evolution, &simulation);
    let wallet = simulation.wallet().unwrap();

    let short = Gene::from_bits(vec![false; RECORD_WIDTH - 1]);
    let individuals = vec![
        Individual::new(never(), never(), &wallet),
        Individual::new(short, never(), &wallet),
    ];
    snapshot::save(&key.path_in(dir.path()), &key, &individuals).unwrap();

    assert!(Incubator::new(evolution, simulation, &storage).is_err());
}
