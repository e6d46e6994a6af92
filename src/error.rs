use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradegeneError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Unsupported snapshot format version {found} (supported: {supported})")]
    SnapshotVersion { found: u32, supported: u32 },

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Run interrupted before generation {generation} completed")]
    Interrupted { generation: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, TradegeneError>;
