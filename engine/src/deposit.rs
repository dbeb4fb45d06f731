//! Moving pool assets into custody and any balance back out.

use crate::context::{require_nonzero, WorkflowContext};
use crate::error::EngineError;
use offset_services::Host;
use offset_types::{Amount, AssetId};

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    /// Pull a redeemable asset from the caller and credit it.
    pub(crate) fn deposit(&mut self, asset: AssetId, amount: Amount) -> Result<Amount, EngineError> {
        require_nonzero(amount)?;
        self.require_redeemable(&asset)?;
        self.host
            .pull(&asset, &self.caller, amount)
            .map_err(EngineError::TransferFailed)?;
        let balance = self.ledger.credit(&self.caller, &asset, amount)?;
        tracing::debug!(depositor = %self.caller, %asset, %amount, "deposited");
        Ok(balance)
    }

    /// Debit any held balance and send it back to the caller.
    pub(crate) fn withdraw(&mut self, asset: AssetId, amount: Amount) -> Result<Amount, EngineError> {
        require_nonzero(amount)?;
        let balance = self.ledger.debit(&self.caller, &asset, amount)?;
        self.host
            .push(&asset, &self.caller, amount)
            .map_err(EngineError::TransferFailed)?;
        tracing::debug!(depositor = %self.caller, %asset, %amount, "withdrawn");
        Ok(balance)
    }
}
