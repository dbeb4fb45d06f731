//! State threaded through one atomic invocation.

use crate::error::EngineError;
use crate::planner::ConversionPlanner;
use crate::records::AuditEvent;
use offset_ledger::LedgerTxn;
use offset_registry::EligibilitySnapshot;
use offset_services::Host;
use offset_types::{Amount, AssetId, Capability, DepositorId};

/// Everything a step may read or mutate while a workflow runs.
///
/// Ledger changes and audit events are staged here and only become visible
/// if the runner commits. External effects go straight to the host, which
/// the runner reverts on failure.
pub(crate) struct WorkflowContext<'a, H: ?Sized> {
    pub(crate) host: &'a mut H,
    pub(crate) ledger: LedgerTxn<'a>,
    pub(crate) snapshot: &'a EligibilitySnapshot,
    pub(crate) planner: &'a ConversionPlanner,
    pub(crate) caller: DepositorId,
    pub(crate) events: Vec<AuditEvent>,
}

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    pub(crate) fn require_swappable(&self, asset: &AssetId) -> Result<(), EngineError> {
        if !self.snapshot.is_swappable(asset) {
            return Err(EngineError::IneligibleAsset {
                asset: *asset,
                required: Capability::Swappable,
            });
        }
        Ok(())
    }

    pub(crate) fn require_redeemable(&self, asset: &AssetId) -> Result<(), EngineError> {
        if !self.snapshot.is_redeemable(asset) {
            return Err(EngineError::IneligibleAsset {
                asset: *asset,
                required: Capability::Redeemable,
            });
        }
        Ok(())
    }

    /// Fail before anything moves if the caller's staged balance is short.
    pub(crate) fn require_balance(&self, asset: &AssetId, needed: Amount) -> Result<(), EngineError> {
        let available = self.ledger.balance_of(&self.caller, asset);
        if available < needed {
            return Err(EngineError::InsufficientBalance {
                depositor: self.caller,
                asset: *asset,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Every asset whose total this invocation changed must still be covered
    /// by what custody actually holds.
    pub(crate) fn verify_custody(&self) -> Result<(), EngineError> {
        for asset in self.ledger.touched_assets() {
            self.ledger.check_custody(&asset, self.host.held(&asset))?;
        }
        Ok(())
    }
}

pub(crate) fn require_nonzero(amount: Amount) -> Result<(), EngineError> {
    if amount.is_zero() {
        return Err(EngineError::ZeroAmount);
    }
    Ok(())
}
