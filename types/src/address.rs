//! 20-byte account identifiers for assets and depositors.
//!
//! Both render as `0x`-prefixed lowercase hex and parse from the same form,
//! which is also how they appear in TOML configuration and JSON output.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of an identifier in bytes.
pub const ADDRESS_LEN: usize = 20;

fn parse_hex_address(s: &str) -> Result<[u8; ADDRESS_LEN], TypeError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| TypeError::InvalidAddress(format!("{s}: missing 0x prefix")))?;
    let bytes = hex::decode(digits).map_err(|e| TypeError::InvalidAddress(format!("{s}: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| TypeError::InvalidAddress(format!("{s}: expected {ADDRESS_LEN} bytes, got {}", b.len())))
}

/// Identifier of an external fungible asset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId([u8; ADDRESS_LEN]);

impl AssetId {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AssetId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_address(s).map(Self)
    }
}

impl TryFrom<String> for AssetId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

/// Identifier of a party that deposits assets into the aggregator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepositorId([u8; ADDRESS_LEN]);

impl DepositorId {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Debug for DepositorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepositorId(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for DepositorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for DepositorId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_address(s).map(Self)
    }
}

impl TryFrom<String> for DepositorId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DepositorId> for String {
    fn from(id: DepositorId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let id = AssetId::new([0xab; ADDRESS_LEN]);
        let text = id.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(ADDRESS_LEN)));
        assert_eq!(text.parse::<AssetId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let err = "ab".repeat(ADDRESS_LEN).parse::<AssetId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidAddress(_)));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("0xabcd".parse::<DepositorId>().is_err());
        assert!(format!("0x{}", "00".repeat(21)).parse::<DepositorId>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(format!("0x{}", "zz".repeat(ADDRESS_LEN)).parse::<AssetId>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = DepositorId::new([1; ADDRESS_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(ADDRESS_LEN)));
        let back: DepositorId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
