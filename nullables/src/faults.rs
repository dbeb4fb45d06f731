//! Programmable misbehaviour for the in-memory chain.

use offset_types::{Amount, AssetId};

/// Faults survive checkpoint reverts: they describe the collaborators, not
/// the state those collaborators hold.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    /// Refuse to pull tokens from depositors.
    pub reject_pulls: bool,
    /// Refuse every swap execution.
    pub reject_swaps: bool,
    /// Refuse every redemption.
    pub reject_redemptions: bool,
    /// Refuse every retirement.
    pub reject_retirements: bool,
    /// Refuse retirements of one specific certificate only.
    pub reject_retirement_of: Option<AssetId>,
    /// Depositors refuse incoming native value.
    pub reject_native_refunds: bool,
    /// Quotes come back one element short.
    pub truncate_quotes: bool,
    /// Exact-output quotes report one unit more than requested at the end of the path.
    pub skew_quote_output: bool,
    /// Redemption amount arrays come back one element short.
    pub truncate_redemptions: bool,
    /// Redemptions deliver this much less of the newest certificate than requested.
    pub redemption_shortfall: Amount,
    /// Refuse to release checkpoints.
    pub reject_release: bool,
    /// Refuse to revert to checkpoints.
    pub reject_revert: bool,
    /// Exact-output executions consume this much less input than quoted.
    pub input_discount: Amount,
    /// Exact-input executions report this much more output than they deliver.
    pub phantom_output: Amount,
}
