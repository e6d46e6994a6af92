use super::{
    evolution::EvolutionConfig,
    simulation::SimulationConfig,
    storage::StorageConfig,
    traits::ConfigSection,
};
use crate::error::TradegeneError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Environment variables with this prefix override file values,
/// e.g. `TRADEGENE__EVOLUTION__POPULATION_SIZE=64`.
pub const ENV_PREFIX: &str = "TRADEGENE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub simulation: SimulationConfig,
    pub storage: StorageConfig,
}

/// Validate one section, tagging configuration errors with its name
fn validate_section<T: ConfigSection>(section: &T) -> Result<(), TradegeneError> {
    section.validate().map_err(|e| match e {
        TradegeneError::Configuration(msg) => {
            TradegeneError::Configuration(format!("[{}] {}", T::section_name(), msg))
        }
        other => other,
    })
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), TradegeneError> {
        validate_section(&self.evolution)?;
        validate_section(&self.simulation)?;
        validate_section(&self.storage)?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML file layered with environment overrides
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TradegeneError> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TradegeneError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| TradegeneError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| TradegeneError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), TradegeneError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = config.clone();
        f(&mut updated);
        updated.validate()?;
        *config = updated;
        Ok(())
    }
}
