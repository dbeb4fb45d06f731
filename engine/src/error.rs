use offset_ledger::LedgerError;
use offset_services::ServiceError;
use offset_types::{Amount, AssetId, Capability, DepositorId};
use thiserror::Error;

/// Why a workflow was rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("asset {asset} is not curated as {required}")]
    IneligibleAsset { asset: AssetId, required: Capability },

    #[error("insufficient balance of {asset} for {depositor}: need {needed}, have {available}")]
    InsufficientBalance {
        depositor: DepositorId,
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error("insufficient input: need {needed}, supplied {supplied}")]
    InsufficientInput { needed: Amount, supplied: Amount },

    #[error("refund of {amount} native value to {to} failed: {source}")]
    RefundFailed {
        to: DepositorId,
        amount: Amount,
        source: ServiceError,
    },

    #[error("swap service returned an inconsistent quote: {0}")]
    QuoteInconsistency(String),

    #[error("array length mismatch: {left} != {right}")]
    ArrayLengthMismatch { left: usize, right: usize },

    #[error("empty input")]
    EmptyInput,

    #[error("zero amount")]
    ZeroAmount,

    #[error("attached native value {attached} does not match {expected}")]
    AttachedValueMismatch { attached: Amount, expected: Amount },

    #[error("swap failed: {0}")]
    SwapFailed(#[source] ServiceError),

    #[error("transfer failed: {0}")]
    TransferFailed(#[source] ServiceError),

    #[error("redemption failed: {0}")]
    RedemptionFailed(#[source] ServiceError),

    #[error("redemption of {requested} delivered only {delivered} in certificates")]
    RedemptionShortfall { requested: Amount, delivered: Amount },

    #[error("retirement of {certificate} failed: {source}")]
    RetirementFailed {
        certificate: AssetId,
        source: ServiceError,
    },

    #[error("ledger records {recorded} of {asset} but custody holds only {held}")]
    CustodyViolation {
        asset: AssetId,
        recorded: Amount,
        held: Amount,
    },

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    #[error("environment error: {0}")]
    Environment(#[source] ServiceError),

    /// The environment could not be reverted after `reason` aborted the
    /// operation; its external effects may have been kept.
    #[error("{reason}; rollback also failed: {source}")]
    RollbackFailed {
        reason: Box<EngineError>,
        source: ServiceError,
    },
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                depositor,
                asset,
                needed,
                available,
            } => Self::InsufficientBalance {
                depositor,
                asset,
                needed,
                available,
            },
            LedgerError::CustodyExceeded {
                asset,
                recorded,
                held,
            } => Self::CustodyViolation {
                asset,
                recorded,
                held,
            },
            other => Self::Ledger(other),
        }
    }
}
