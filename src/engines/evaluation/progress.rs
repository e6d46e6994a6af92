use log::{debug, info};

/// Hooks the incubator calls while a generation runs
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_bar(&mut self, position: usize, total: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        info!("Generation {} starting...", generation + 1);
    }

    fn on_bar(&mut self, position: usize, total: usize) {
        if position % 100 == 0 || position + 1 == total {
            debug!("  Bar {}/{}", position + 1, total);
        }
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64) {
        info!(
            "Generation {} complete. Best fitness: {:.4}",
            generation + 1,
            best_fitness
        );
    }
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_bar(&mut self, _position: usize, _total: usize) {}
    fn on_generation_complete(&mut self, _generation: usize, _best_fitness: f64) {}
}
