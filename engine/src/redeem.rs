//! Redeem executor: pool asset in, oldest certificate inventory out.

use crate::context::{require_nonzero, WorkflowContext};
use crate::error::EngineError;
use crate::records::AuditEvent;
use offset_services::{Host, Redemption};
use offset_types::{Amount, AssetId};

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    /// Exchange `amount` of the caller's `pool` balance for certificates.
    pub(crate) fn auto_redeem(&mut self, pool: AssetId, amount: Amount) -> Result<Redemption, EngineError> {
        require_nonzero(amount)?;
        self.require_redeemable(&pool)?;
        self.require_balance(&pool, amount)?;

        let redemption = self
            .host
            .redeem_oldest(&pool, amount)
            .map_err(EngineError::RedemptionFailed)?;
        if redemption.certificates.len() != redemption.amounts.len() {
            return Err(EngineError::ArrayLengthMismatch {
                left: redemption.certificates.len(),
                right: redemption.amounts.len(),
            });
        }

        let delivered: Amount = redemption.amounts.iter().sum();
        if delivered != amount {
            return Err(EngineError::RedemptionShortfall {
                requested: amount,
                delivered,
            });
        }

        self.ledger.debit(&self.caller, &pool, amount)?;
        for (certificate, credited) in redemption.certificates.iter().zip(&redemption.amounts) {
            self.ledger.credit(&self.caller, certificate, *credited)?;
        }

        tracing::debug!(
            depositor = %self.caller,
            %pool,
            %amount,
            certificates = redemption.certificates.len(),
            "pool asset redeemed"
        );
        self.events.push(AuditEvent::Redeemed {
            depositor: self.caller,
            pool,
            certificates: redemption.certificates.clone(),
            amounts: redemption.amounts.clone(),
        });
        Ok(redemption)
    }
}
