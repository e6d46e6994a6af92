use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tradegene::config::ConfigManager;
use tradegene::data::CsvConnector;
use tradegene::engines::evaluation::{ConsoleProgressCallback, Incubator, WalkForward};

#[derive(Parser, Debug)]
#[command(name = "tradegene")]
#[command(author, version, about = "Evolves trading rules against price history")]
struct Args {
    /// TOML config file; `TRADEGENE__*` environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Market as SYMBOL-QUOTE, e.g. ETH-EUR
    #[arg(long)]
    market: Option<String>,

    #[arg(long)]
    interval: Option<String>,

    #[arg(long)]
    population: Option<usize>,

    /// Clause records per gene
    #[arg(long)]
    gene_size: Option<usize>,

    #[arg(long)]
    window: Option<usize>,

    /// Directory holding population snapshots
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "timestamp")]
    timestamp_column: String,

    #[arg(long, default_value = "close")]
    close_column: String,

    /// Stop after the current bar once this file exists
    #[arg(long)]
    stop_file: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Train the population on the most recent window of a CSV history
    Evolve {
        data: PathBuf,
        #[arg(long, default_value_t = 1)]
        generations: usize,
    },
    /// Print the best strategy of the saved population
    Best,
    /// Incubate on a sliding window and paper-trade the best strategy
    WalkForward { data: PathBuf },
}

fn watch_stop_file(path: PathBuf, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            if path.exists() {
                info!("Stop file {} found", path.display());
                stop.store(true, Ordering::SeqCst);
                break;
            }
            thread::sleep(Duration::from_millis(500));
        }
    });
}

fn load_history(path: &Path, args: &Args) -> Result<tradegene::data::PriceHistory> {
    CsvConnector::load_history(path, &args.timestamp_column, &args.close_column)
        .with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }
    manager.update(|c| {
        if let Some(market) = &args.market {
            c.simulation.market = market.clone();
        }
        if let Some(interval) = &args.interval {
            c.simulation.interval = interval.clone();
        }
        if let Some(population) = args.population {
            c.evolution.population_size = population;
        }
        if let Some(gene_size) = args.gene_size {
            c.evolution.gene_size = gene_size;
        }
        if let Some(window) = args.window {
            c.evolution.window_size = window;
        }
        if let Some(data_dir) = &args.data_dir {
            c.storage.data_dir = data_dir.clone();
        }
        if args.seed.is_some() {
            c.evolution.seed = args.seed;
        }
    })?;
    let config = manager.get();

    let mut incubator = Incubator::new(config.evolution.clone(), config.simulation, &config.storage)?;
    if let Some(path) = &args.stop_file {
        watch_stop_file(path.clone(), incubator.stop_handle());
    }
    let mut progress = ConsoleProgressCallback;

    match &args.mode {
        Mode::Evolve { data, generations } => {
            if *generations == 0 {
                bail!("--generations must be >= 1");
            }
            let history = load_history(data, &args)?;
            let window = history.tail(config.evolution.window_size);
            let best = incubator.incubate(&window, *generations, &mut progress)?;
            println!("Best fitness: {:.2}", best.fitness);
            println!("{}", best.strategy);
        }
        Mode::Best => match incubator.best_strategy() {
            Some(best) => {
                println!("Fitness: {:.2}", best.fitness);
                println!("{}", best.strategy);
            }
            None => bail!("population is empty"),
        },
        Mode::WalkForward { data } => {
            let history = load_history(data, &args)?;
            let report = WalkForward::from_config(&config.evolution).run(
                &mut incubator,
                &history,
                &mut progress,
            )?;
            println!("{}", report);
        }
    }

    Ok(())
}
