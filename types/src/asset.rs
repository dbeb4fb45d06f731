//! Curated asset descriptions and their capability tags.

use crate::address::AssetId;
use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the aggregator is allowed to do with an asset.
///
/// `Swappable` and `Redeemable` are disjoint: an asset is either a payment
/// token that gets converted, or a pool asset that gets redeemed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// May be converted into a pool asset through the swap router.
    Swappable,
    /// Pool asset that may be exchanged for certificate assets.
    Redeemable,
    /// Retirement-certificate asset, produced by redemption and consumed by retirement.
    Certificate,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swappable => "swappable",
            Self::Redeemable => "redeemable",
            Self::Certificate => "certificate",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "swappable" => Ok(Self::Swappable),
            "redeemable" => Ok(Self::Redeemable),
            "certificate" => Ok(Self::Certificate),
            other => Err(TypeError::UnknownCapability(other.to_string())),
        }
    }
}

/// A curated asset: symbolic name, identifier, capability tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub id: AssetId,
    pub capability: Capability,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, id: AssetId, capability: Capability) -> Self {
        Self {
            symbol: symbol.into(),
            id,
            capability,
        }
    }

    pub fn is_swappable(&self) -> bool {
        self.capability == Capability::Swappable
    }

    pub fn is_redeemable(&self) -> bool {
        self.capability == Capability::Redeemable
    }
}
