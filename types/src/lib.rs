//! Fundamental types for the offset aggregator.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: asset and depositor identifiers, raw amounts, curated asset
//! descriptions, and block timestamps.

pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod time;

pub use address::{AssetId, DepositorId, ADDRESS_LEN};
pub use amount::Amount;
pub use asset::{Asset, Capability};
pub use error::TypeError;
pub use time::Timestamp;
