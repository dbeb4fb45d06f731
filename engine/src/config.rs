//! Aggregator configuration with TOML file support.

use crate::planner::Routing;
use offset_registry::{EligibilityRegistry, RegistryError};
use offset_types::{Asset, AssetId, Capability};
use offset_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("routing refers to unknown asset symbol {0}")]
    UnknownSymbol(String),

    #[error("intermediary {symbol} must be {required}, is {actual}")]
    IntermediaryNotSwappable {
        symbol: String,
        required: Capability,
        actual: Capability,
    },
}

/// How paths are routed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Symbol of the universal intermediary. Must be a curated swappable asset.
    pub intermediary: String,
    /// Identifier of the wrapped native asset. Need not be curated.
    pub wrapped_native: AssetId,
}

/// Configuration for an [`OffsetAggregator`](crate::OffsetAggregator).
///
/// Loaded from TOML via [`AggregatorConfig::from_toml_file`] or built
/// programmatically for tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    pub routing: RoutingConfig,

    /// Curated allow-list.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AggregatorConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Allow-list described by `assets`.
    pub fn build_registry(&self) -> Result<EligibilityRegistry, ConfigError> {
        Ok(EligibilityRegistry::with_assets(self.assets.iter().cloned())?)
    }

    /// Resolve the routing symbols against `registry`.
    pub fn routing(&self, registry: &EligibilityRegistry) -> Result<Routing, ConfigError> {
        let symbol = &self.routing.intermediary;
        let intermediary = registry
            .get(symbol)
            .ok_or_else(|| ConfigError::UnknownSymbol(symbol.clone()))?;
        if !intermediary.is_swappable() {
            return Err(ConfigError::IntermediaryNotSwappable {
                symbol: symbol.clone(),
                required: Capability::Swappable,
                actual: intermediary.capability,
            });
        }
        Ok(Routing {
            intermediary: intermediary.id,
            wrapped_native: self.routing.wrapped_native,
        })
    }
}
