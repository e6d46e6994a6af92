use super::traits::ConfigSection;
use crate::error::TradegeneError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding population snapshots
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ConfigSection for StorageConfig {
    fn section_name() -> &'static str {
        "storage"
    }

    fn validate(&self) -> Result<(), TradegeneError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(TradegeneError::Configuration(
                "Data directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
