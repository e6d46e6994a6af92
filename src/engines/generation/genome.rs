//! Bit-string chromosome for one trading rule
//!
//! A gene is a flat sequence of fixed-width clause records (see
//! [`RECORD_WIDTH`](super::codec::RECORD_WIDTH)). Every bit pattern decodes to
//! a valid rule, so crossover and mutation never have to repair a gene.
//!
//! Genes serialize as a string of `'0'`/`'1'` characters, one per bit.
//!
//! # Example
//!
//! ```
//! use tradegene::engines::generation::Gene;
//!
//! let gene: Gene = "0".repeat(40).parse().unwrap();
//! assert_eq!(gene.len(), 40);
//! ```

use crate::engines::generation::codec::RECORD_WIDTH;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gene {
    bits: Vec<bool>,
}

impl Gene {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of complete clause records in the gene
    pub fn record_count(&self) -> usize {
        self.bits.len() / RECORD_WIDTH
    }

    /// Read `width` bits starting at `offset` as an unsigned big-endian integer.
    /// Bits past the end read as zero.
    pub fn read_uint(&self, offset: usize, width: usize) -> u32 {
        (offset..offset + width).fold(0u32, |acc, i| {
            (acc << 1) | u32::from(self.bits.get(i).copied().unwrap_or(false))
        })
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGeneError {
    position: usize,
    found: char,
}

impl fmt::Display for ParseGeneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid gene character '{}' at position {}", self.found, self.position)
    }
}

impl std::error::Error for ParseGeneError {}

impl FromStr for Gene {
    type Err = ParseGeneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(ParseGeneError { position, found }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }
}

impl TryFrom<String> for Gene {
    type Error = ParseGeneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gene> for String {
    fn from(gene: Gene) -> Self {
        gene.to_string()
    }
}

/// Generate a gene of `record_count` records with uniformly random bits
pub fn new_gene<R: Rng>(record_count: usize, rng: &mut R) -> Gene {
    Gene::from_bits((0..record_count * RECORD_WIDTH).map(|_| rng.gen::<bool>()).collect())
}

/// Point mutation: flip every bit independently with probability `rate`
pub fn mutate<R: Rng>(gene: &Gene, rate: f64, rng: &mut R) -> Gene {
    Gene::from_bits(
        gene.bits
            .iter()
            .map(|&bit| if rng.gen::<f64>() < rate { !bit } else { bit })
            .collect(),
    )
}
