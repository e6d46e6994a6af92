use crate::engines::generation::codec::{RECORD_WIDTH, STOP_LOSS_WIDTH};
use crate::engines::generation::{Gene, Individual};
use crate::error::{Result, TradegeneError};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 2;

/// Version 1 records had no stop-loss field
const LEGACY_RECORD_WIDTH: usize = RECORD_WIDTH - STOP_LOSS_WIDTH;

/// Identifies which run a snapshot belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub market: String,
    pub interval: String,
    pub window_size: usize,
    pub population_size: usize,
    pub gene_size: usize,
}

impl SnapshotKey {
    pub fn file_name(&self) -> String {
        format!(
            "gene-{}_{}_w{}_p{}_g{}.json",
            self.market, self.interval, self.window_size, self.population_size, self.gene_size
        )
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    format_version: u32,
    key: SnapshotKey,
    saved_at: DateTime<Utc>,
    individuals: Vec<Individual>,
}

/// Pad every 36-bit record of a version 1 gene with a zero stop-loss selector
fn upgrade_legacy_gene(gene: &Gene) -> Gene {
    let mut bits = Vec::with_capacity(gene.len() / LEGACY_RECORD_WIDTH * RECORD_WIDTH);
    for record in gene.bits().chunks(LEGACY_RECORD_WIDTH) {
        bits.extend_from_slice(record);
        if record.len() == LEGACY_RECORD_WIDTH {
            bits.extend(std::iter::repeat(false).take(STOP_LOSS_WIDTH));
        }
    }
    Gene::from_bits(bits)
}

/// Load the individuals saved for `key`. `Ok(None)` when no snapshot exists;
/// unreadable, mismatched or unknown-version files are errors.
pub fn load(path: &Path, key: &SnapshotKey) -> Result<Option<Vec<Individual>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let header: Header = serde_json::from_str(&contents)?;
    let mut snapshot: SnapshotFile = match header.format_version {
        FORMAT_VERSION | 1 => serde_json::from_str(&contents)?,
        found => {
            return Err(TradegeneError::SnapshotVersion {
                found,
                supported: FORMAT_VERSION,
            })
        }
    };

    if snapshot.key != *key {
        return Err(TradegeneError::Persistence(format!(
            "Snapshot {} was saved for {:?}, expected {:?}",
            path.display(),
            snapshot.key,
            key
        )));
    }

    if snapshot.format_version == 1 {
        info!("Upgrading version 1 snapshot {}", path.display());
        for individual in &mut snapshot.individuals {
            individual.buy = upgrade_legacy_gene(&individual.buy);
            individual.sell = upgrade_legacy_gene(&individual.sell);
        }
    }

    Ok(Some(snapshot.individuals))
}

/// Write the whole population or nothing: serialize to a sibling temp file,
/// flush it to disk, then rename over the target.
pub fn save(path: &Path, key: &SnapshotKey, individuals: &[Individual]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let snapshot = SnapshotFile {
        format_version: FORMAT_VERSION,
        key: key.clone(),
        saved_at: Utc::now(),
        individuals: individuals.to_vec(),
    };

    let tmp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let key = SnapshotKey {
            market: "ETH-EUR".to_string(),
            interval: "1h".to_string(),
            window_size: 1440,
            population_size: 32,
            gene_size: 8,
        };
        assert_eq!(key.file_name(), "gene-ETH-EUR_1h_w1440_p32_g8.json");
    }

    #[test]
    fn test_upgrade_legacy_gene() {
        let legacy = Gene::from_bits(vec![true; LEGACY_RECORD_WIDTH * 2]);
        let upgraded = upgrade_legacy_gene(&legacy);
        assert_eq!(upgraded.len(), RECORD_WIDTH * 2);
        assert_eq!(upgraded.read_uint(LEGACY_RECORD_WIDTH, STOP_LOSS_WIDTH), 0);
        assert_eq!(upgraded.read_uint(RECORD_WIDTH, 1), 1);
    }
}
