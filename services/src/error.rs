use offset_types::{Amount, AssetId, Timestamp};
use thiserror::Error;

/// Failure reported by an external service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("call rejected: {0}")]
    Rejected(String),

    #[error("insufficient {asset}: need {needed}, have {available}")]
    InsufficientFunds {
        asset: String,
        needed: Amount,
        available: Amount,
    },

    #[error("allowance for {asset} too low: need {needed}, approved {approved}")]
    AllowanceExceeded {
        asset: AssetId,
        needed: Amount,
        approved: Amount,
    },

    #[error("no market for {from} -> {to}")]
    NoMarket { from: AssetId, to: AssetId },

    #[error("deadline {deadline} passed at {now}")]
    Expired { deadline: Timestamp, now: Timestamp },

    #[error("unknown checkpoint {0}")]
    UnknownCheckpoint(u64),
}
