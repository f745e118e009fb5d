//! Configuration management for the Strata master.

use serde::{Deserialize, Serialize};

use crate::units::GB;

/// Master configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Replica placement configuration.
    pub placement: PlacementConfig,
    /// Per-node allocation ceilings.
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

/// Replica placement configuration.
///
/// Selector names are matched against the four placement policies
/// (`RoundRobin`, `AvailableSpaceFirst`, `CarryWeight`, `Straw`); anything
/// else silently resolves to the `CarryWeight` default, so a node-set always
/// comes up with a working policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Selector policy for data-node placement.
    pub data_node_selector: String,
    /// Selector policy for meta-node placement (both store modes).
    pub meta_node_selector: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            data_node_selector: "CarryWeight".to_string(),
            meta_node_selector: "CarryWeight".to_string(),
        }
    }
}

/// Per-node allocation ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum data partitions hosted by a single data node.
    pub max_data_partitions_per_node: u64,
    /// Maximum meta partitions hosted by a single meta node.
    pub max_meta_partitions_per_node: u64,
    /// Free space floor below which a data node counts as oversold.
    pub data_node_reserved_space: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_data_partitions_per_node: 3000,
            max_meta_partitions_per_node: 10000,
            data_node_reserved_space: 10 * GB,
        }
    }
}
