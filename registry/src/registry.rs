//! Administrative side of the allow-list.

use crate::error::RegistryError;
use crate::snapshot::EligibilitySnapshot;
use offset_types::{Asset, AssetId};
use std::collections::BTreeMap;

/// Registry of curated assets, keyed by symbol.
///
/// Every successful mutation bumps `version`; snapshots carry the version
/// they were taken at.
#[derive(Clone, Debug, Default)]
pub struct EligibilityRegistry {
    assets: BTreeMap<String, Asset>,
    version: u64,
}

impl EligibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of assets, rejecting duplicates and
    /// capability conflicts exactly as [`add`](Self::add) would.
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for asset in assets {
            registry.add(asset)?;
        }
        Ok(registry)
    }

    /// Register a new asset.
    ///
    /// Re-registering an identifier under a second symbol is allowed only
    /// with the same capability.
    pub fn add(&mut self, asset: Asset) -> Result<(), RegistryError> {
        if self.assets.contains_key(&asset.symbol) {
            return Err(RegistryError::DuplicateSymbol(asset.symbol));
        }
        if let Some(existing) = self.find_by_id(&asset.id) {
            if existing.capability != asset.capability {
                return Err(RegistryError::CapabilityConflict {
                    id: asset.id,
                    existing: existing.capability,
                    requested: asset.capability,
                });
            }
        }
        tracing::info!(
            symbol = %asset.symbol,
            id = %asset.id,
            capability = %asset.capability,
            "eligible asset added"
        );
        self.assets.insert(asset.symbol.clone(), asset);
        self.version += 1;
        Ok(())
    }

    /// Remove an asset by symbol, returning its entry.
    pub fn remove(&mut self, symbol: &str) -> Result<Asset, RegistryError> {
        let removed = self
            .assets
            .remove(symbol)
            .ok_or_else(|| RegistryError::NotFound(symbol.to_string()))?;
        tracing::info!(symbol = %removed.symbol, id = %removed.id, "eligible asset removed");
        self.version += 1;
        Ok(removed)
    }

    /// Look up an asset by symbol.
    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.assets.get(symbol)
    }

    fn find_by_id(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.values().find(|a| a.id == *id)
    }

    /// List all registered assets, ordered by symbol.
    pub fn list(&self) -> Vec<&Asset> {
        self.assets.values().collect()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Freeze the current contents for one workflow invocation.
    pub fn snapshot(&self) -> EligibilitySnapshot {
        EligibilitySnapshot::new(self.version, self.assets.values().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offset_types::Capability;

    fn asset(symbol: &str, n: u8, capability: Capability) -> Asset {
        Asset::new(symbol, AssetId::new([n; 20]), capability)
    }

    #[test]
    fn add_and_get() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("USDC", 1, Capability::Swappable)).unwrap();
        assert_eq!(registry.get("USDC").unwrap().id, AssetId::new([1; 20]));
        assert_eq!(registry.version(), 1);
    }

    #[test]
    fn duplicate_symbol_rejected() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("BCT", 2, Capability::Redeemable)).unwrap();
        let err = registry.add(asset("BCT", 3, Capability::Redeemable)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateSymbol("BCT".into()));
        assert_eq!(registry.version(), 1);
    }

    #[test]
    fn swappable_and_redeemable_stay_disjoint() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("NCT", 4, Capability::Redeemable)).unwrap();
        let err = registry.add(asset("NCT2", 4, Capability::Swappable)).unwrap_err();
        assert!(matches!(err, RegistryError::CapabilityConflict { .. }));
    }

    #[test]
    fn alias_with_same_capability_allowed() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("WETH", 5, Capability::Swappable)).unwrap();
        registry.add(asset("ETH.e", 5, Capability::Swappable)).unwrap();
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn remove_bumps_version_and_missing_is_error() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("USDC", 1, Capability::Swappable)).unwrap();
        let removed = registry.remove("USDC").unwrap();
        assert_eq!(removed.symbol, "USDC");
        assert_eq!(registry.version(), 2);
        assert_eq!(
            registry.remove("USDC").unwrap_err(),
            RegistryError::NotFound("USDC".into())
        );
    }

    #[test]
    fn snapshot_is_frozen() {
        let mut registry = EligibilityRegistry::new();
        registry.add(asset("USDC", 1, Capability::Swappable)).unwrap();
        let snapshot = registry.snapshot();
        registry.remove("USDC").unwrap();

        assert!(snapshot.is_swappable(&AssetId::new([1; 20])));
        assert_eq!(snapshot.version(), 1);
        assert!(!registry.snapshot().is_swappable(&AssetId::new([1; 20])));
    }
}
