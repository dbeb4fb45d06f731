//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the aggregator (custody token movements,
//! swap router, redemption pools, retirement registry, block time, and the
//! environment's checkpoint/revert) is abstracted behind the traits in
//! `offset-services`. This crate provides one in-memory implementation of all
//! of them that:
//! - Prices swaps from fixed, programmable rates
//! - Redeems from an explicit oldest-first certificate inventory
//! - Can be told to misbehave (reject calls, return malformed arrays)
//! - Never touches the filesystem or network
//!
//! Usage: hand a [`NullChain`] to the aggregator in tests and in dry runs.

pub mod chain;
pub mod faults;
pub mod market;

pub use chain::{ExternalCall, NullChain};
pub use faults::Faults;
pub use market::{NullMarket, Rate};
