//! Swap router port.

use crate::custody::Holder;
use crate::error::ServiceError;
use offset_types::{Amount, AssetId, Timestamp};

/// How the router is paid for the first hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Funding {
    /// The router draws the input token from custody against a prior approval.
    Allowance,
    /// Native value forwarded with the call. The router returns whatever it
    /// does not consume to custody.
    Native(Amount),
}

/// Buy exactly `amount_out` of the last path asset, spending at most `max_amount_in`.
#[derive(Clone, Copy, Debug)]
pub struct ExactOutputOrder<'a> {
    pub path: &'a [AssetId],
    pub amount_out: Amount,
    pub max_amount_in: Amount,
    pub recipient: Holder,
    pub deadline: Timestamp,
    pub funding: Funding,
}

/// Sell exactly `amount_in` of the first path asset, receiving at least `min_amount_out`.
#[derive(Clone, Copy, Debug)]
pub struct ExactInputOrder<'a> {
    pub path: &'a [AssetId],
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub recipient: Holder,
    pub deadline: Timestamp,
    pub funding: Funding,
}

/// An external multi-hop swap router.
///
/// Every call returns one amount per path element: the amount entering each
/// hop, ending with the amount delivered.
pub trait SwapRouter {
    fn quote_exact_output(&self, path: &[AssetId], amount_out: Amount) -> Result<Vec<Amount>, ServiceError>;

    fn quote_exact_input(&self, path: &[AssetId], amount_in: Amount) -> Result<Vec<Amount>, ServiceError>;

    fn execute_exact_output(&mut self, order: ExactOutputOrder<'_>) -> Result<Vec<Amount>, ServiceError>;

    fn execute_exact_input(&mut self, order: ExactInputOrder<'_>) -> Result<Vec<Amount>, ServiceError>;
}
