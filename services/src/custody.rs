//! Asset movements in and out of the aggregator's custody.

use crate::error::ServiceError;
use offset_types::{Amount, AssetId, DepositorId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who holds an external balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Holder {
    /// The aggregator itself.
    Custody,
    Depositor(DepositorId),
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custody => f.write_str("custody"),
            Self::Depositor(id) => write!(f, "{id}"),
        }
    }
}

/// Token and native-value movements performed on the aggregator's behalf.
pub trait Custody {
    /// Pull `amount` of `asset` from `from` into custody (transfer-from).
    fn pull(&mut self, asset: &AssetId, from: &DepositorId, amount: Amount) -> Result<(), ServiceError>;

    /// Send `amount` of `asset` out of custody to `to`.
    fn push(&mut self, asset: &AssetId, to: &DepositorId, amount: Amount) -> Result<(), ServiceError>;

    /// Set the swap router's allowance over custody's `asset`. Zero revokes.
    fn approve_router(&mut self, asset: &AssetId, amount: Amount) -> Result<(), ServiceError>;

    /// Remaining router allowance over custody's `asset`.
    fn router_allowance(&self, asset: &AssetId) -> Amount;

    /// Amount of `asset` actually held by custody.
    fn held(&self, asset: &AssetId) -> Amount;

    /// Accept native value attached to the caller's invocation.
    fn receive_native(&mut self, from: &DepositorId, amount: Amount) -> Result<(), ServiceError>;

    /// Send native value out of custody.
    fn send_native(&mut self, to: &DepositorId, amount: Amount) -> Result<(), ServiceError>;

    /// Native value held by custody.
    fn native_held(&self) -> Amount;
}
