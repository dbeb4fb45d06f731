//! Redemption service port.

use crate::error::ServiceError;
use offset_types::{Amount, AssetId};
use serde::{Deserialize, Serialize};

/// Certificate assets handed out for a pool redemption, as parallel arrays.
///
/// The arrays come straight from the external service and are not trusted
/// to be the same length.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub certificates: Vec<AssetId>,
    pub amounts: Vec<Amount>,
}

/// Exchanges pool assets held by custody for certificate assets.
pub trait RedemptionService {
    /// Burn `amount` of `pool` from custody and deliver the oldest
    /// (lowest-quality) certificate inventory in exchange.
    fn redeem_oldest(&mut self, pool: &AssetId, amount: Amount) -> Result<Redemption, ServiceError>;
}
