//! Frozen view of the allow-list handed to each workflow.

use offset_types::{Asset, AssetId, Capability};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug)]
struct SnapshotInner {
    version: u64,
    by_symbol: BTreeMap<String, Asset>,
    by_id: HashMap<AssetId, Capability>,
}

/// Immutable, cheaply clonable copy of the registry at one version.
#[derive(Clone, Debug)]
pub struct EligibilitySnapshot {
    inner: Arc<SnapshotInner>,
}

impl EligibilitySnapshot {
    pub(crate) fn new(version: u64, assets: impl IntoIterator<Item = Asset>) -> Self {
        let mut by_symbol = BTreeMap::new();
        let mut by_id = HashMap::new();
        for asset in assets {
            by_id.insert(asset.id, asset.capability);
            by_symbol.insert(asset.symbol.clone(), asset);
        }
        Self {
            inner: Arc::new(SnapshotInner {
                version,
                by_symbol,
                by_id,
            }),
        }
    }

    /// Registry version this snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.inner.version
    }

    pub fn is_swappable(&self, asset: &AssetId) -> bool {
        self.capability_of(asset) == Some(Capability::Swappable)
    }

    pub fn is_redeemable(&self, asset: &AssetId) -> bool {
        self.capability_of(asset) == Some(Capability::Redeemable)
    }

    /// The capability an identifier is curated under, if any.
    pub fn capability_of(&self, asset: &AssetId) -> Option<Capability> {
        self.inner.by_id.get(asset).copied()
    }

    /// Resolve a symbol to its curated entry.
    pub fn resolve(&self, symbol: &str) -> Option<&Asset> {
        self.inner.by_symbol.get(symbol)
    }

    /// First symbol registered for an identifier, for display.
    pub fn symbol_of(&self, asset: &AssetId) -> Option<&str> {
        self.inner
            .by_symbol
            .values()
            .find(|a| a.id == *asset)
            .map(|a| a.symbol.as_str())
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.inner.by_symbol.values()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.by_symbol.is_empty()
    }
}
