use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{error::Result, math::RoundingMode};

/// what the encoder does when it meets NaN or an infinity
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// abort the conversion with a format error
    #[default]
    Reject,
    /// write `NaN`, `inf` or `-inf` in place of the value
    Sentinel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub decimals: usize, // fractional digits per m/z and intensity value
    pub rounding: RoundingMode,
    pub non_finite: NonFinitePolicy,
}

impl Default for ConversionConfig {
    fn default() -> ConversionConfig {
        ConversionConfig {
            decimals: 4,
            rounding: RoundingMode::HalfAwayFromZero,
            non_finite: NonFinitePolicy::Reject,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub allow_duplicate_pixels: bool, // false turns coordinate collisions into integrity errors
    /// compare against the bounds persisted by the converter; turning this off is logged
    pub verify_bounds: bool,
}

impl Default for IndexingConfig {
    fn default() -> IndexingConfig {
        IndexingConfig { allow_duplicate_pixels: true, verify_bounds: true }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionConfig,
    pub indexing: IndexingConfig,
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
