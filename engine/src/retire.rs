//! Retire executor: permanent consumption of certificate balances.

use crate::context::WorkflowContext;
use crate::error::EngineError;
use crate::records::AuditEvent;
use offset_services::Host;
use offset_types::{Amount, AssetId};
use serde::{Deserialize, Serialize};

/// One certificate amount that was retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retirement {
    pub certificate: AssetId,
    pub amount: Amount,
}

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    /// Retire each (certificate, amount) pair in input order.
    ///
    /// Zero amounts are skipped. `origin` is the pool the certificates were
    /// redeemed from when that happened in the same invocation.
    pub(crate) fn auto_retire(
        &mut self,
        certificates: &[AssetId],
        amounts: &[Amount],
        origin: Option<AssetId>,
    ) -> Result<Vec<Retirement>, EngineError> {
        if certificates.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        if certificates.len() != amounts.len() {
            return Err(EngineError::ArrayLengthMismatch {
                left: certificates.len(),
                right: amounts.len(),
            });
        }

        let mut retired = Vec::with_capacity(certificates.len());
        for (certificate, amount) in certificates.iter().zip(amounts) {
            if amount.is_zero() {
                continue;
            }
            self.require_balance(certificate, *amount)?;
            self.ledger.debit(&self.caller, certificate, *amount)?;
            self.host
                .retire(certificate, *amount)
                .map_err(|source| EngineError::RetirementFailed {
                    certificate: *certificate,
                    source,
                })?;

            tracing::debug!(depositor = %self.caller, %certificate, %amount, "certificate retired");
            self.events.push(AuditEvent::Retired {
                depositor: self.caller,
                certificate: *certificate,
                amount: *amount,
                pool: origin,
            });
            retired.push(Retirement {
                certificate: *certificate,
                amount: *amount,
            });
        }
        Ok(retired)
    }
}
