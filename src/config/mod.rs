pub mod traits;
pub mod evolution;
pub mod simulation;
pub mod storage;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::EvolutionConfig;
pub use simulation::SimulationConfig;
pub use storage::StorageConfig;
pub use traits::ConfigSection;
