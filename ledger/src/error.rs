use offset_types::{Amount, AssetId, DepositorId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {asset} for {depositor}: need {needed}, have {available}")]
    InsufficientBalance {
        depositor: DepositorId,
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error("arithmetic overflow crediting {asset}")]
    Overflow { asset: AssetId },

    #[error("ledger records {recorded} of {asset} but custody holds only {held}")]
    CustodyExceeded {
        asset: AssetId,
        recorded: Amount,
        held: Amount,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}
