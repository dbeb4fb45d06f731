//! Swap executor: one conversion into a pool asset, credited to the caller.

use crate::context::{require_nonzero, WorkflowContext};
use crate::error::EngineError;
use crate::planner::{verify_amounts, Payment};
use offset_services::{ExactInputOrder, ExactOutputOrder, Funding, Holder, Host};
use offset_types::{Amount, AssetId};
use serde::{Deserialize, Serialize};

/// Payment together with the means to move it into custody.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Funds {
    /// Native value attached to the invocation.
    Native { attached: Amount },
    /// A token pulled from the caller against their prior approval.
    Token { asset: AssetId },
}

impl Funds {
    pub fn payment(&self) -> Payment {
        match self {
            Self::Native { .. } => Payment::Native,
            Self::Token { asset } => Payment::Token(*asset),
        }
    }

    pub fn attached(&self) -> Amount {
        match self {
            Self::Native { attached } => *attached,
            Self::Token { .. } => Amount::ZERO,
        }
    }
}

/// What a conversion actually did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub path: Vec<AssetId>,
    /// Input the router consumed.
    pub amount_in: Amount,
    /// Output credited to the caller.
    pub amount_out: Amount,
    /// Input handed back to the caller.
    pub refunded: Amount,
}

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    fn check_swap_pair(&self, funds: Funds, to: &AssetId) -> Result<Vec<AssetId>, EngineError> {
        let payment = funds.payment();
        if let Payment::Token(from) = payment {
            self.require_swappable(&from)?;
        }
        self.require_redeemable(to)?;
        let from = self.planner.source_of(payment);
        Ok(self.planner.plan_path(from, *to))
    }

    fn revoke_unused_allowance(&mut self, asset: &AssetId) -> Result<(), EngineError> {
        if !self.host.router_allowance(asset).is_zero() {
            self.host
                .approve_router(asset, Amount::ZERO)
                .map_err(EngineError::TransferFailed)?;
        }
        Ok(())
    }

    /// Buy exactly `desired` of `to` and credit it to the caller.
    pub(crate) fn swap_exact_output(
        &mut self,
        funds: Funds,
        to: AssetId,
        desired: Amount,
    ) -> Result<SwapOutcome, EngineError> {
        require_nonzero(desired)?;
        let path = self.check_swap_pair(funds, &to)?;
        let quote = self.planner.quote_exact_output(&*self.host, &path, desired)?;
        let needed = quote.amount_in();
        let deadline = self.host.block_time();

        let (consumed, refunded) = match funds {
            Funds::Token { asset } => {
                self.host
                    .pull(&asset, &self.caller, needed)
                    .map_err(EngineError::TransferFailed)?;
                self.host
                    .approve_router(&asset, needed)
                    .map_err(EngineError::TransferFailed)?;
                let amounts = self
                    .host
                    .execute_exact_output(ExactOutputOrder {
                        path: &path,
                        amount_out: desired,
                        max_amount_in: needed,
                        recipient: Holder::Custody,
                        deadline,
                        funding: Funding::Allowance,
                    })
                    .map_err(EngineError::SwapFailed)?;
                let consumed = checked_exact_output(&path, &amounts, desired, needed)?;
                self.revoke_unused_allowance(&asset)?;

                let refund = needed.saturating_sub(consumed);
                if !refund.is_zero() {
                    self.host
                        .push(&asset, &self.caller, refund)
                        .map_err(EngineError::TransferFailed)?;
                }
                (consumed, refund)
            }
            Funds::Native { attached } => {
                if needed > attached {
                    return Err(EngineError::InsufficientInput {
                        needed,
                        supplied: attached,
                    });
                }
                self.host
                    .receive_native(&self.caller, attached)
                    .map_err(EngineError::TransferFailed)?;
                let amounts = self
                    .host
                    .execute_exact_output(ExactOutputOrder {
                        path: &path,
                        amount_out: desired,
                        max_amount_in: needed,
                        recipient: Holder::Custody,
                        deadline,
                        funding: Funding::Native(needed),
                    })
                    .map_err(EngineError::SwapFailed)?;
                let consumed = checked_exact_output(&path, &amounts, desired, needed)?;

                let refund = attached.saturating_sub(consumed);
                if !refund.is_zero() {
                    self.host
                        .send_native(&self.caller, refund)
                        .map_err(|source| EngineError::RefundFailed {
                            to: self.caller,
                            amount: refund,
                            source,
                        })?;
                }
                (consumed, refund)
            }
        };

        self.ledger.credit(&self.caller, &to, desired)?;
        tracing::debug!(
            depositor = %self.caller,
            pool = %to,
            hops = path.len() - 1,
            amount_in = %consumed,
            amount_out = %desired,
            refunded = %refunded,
            "exact-output swap executed"
        );
        Ok(SwapOutcome {
            path,
            amount_in: consumed,
            amount_out: desired,
            refunded,
        })
    }

    /// Sell exactly `supplied` of the payment and credit whatever arrives.
    pub(crate) fn swap_exact_input(
        &mut self,
        funds: Funds,
        supplied: Amount,
        to: AssetId,
    ) -> Result<SwapOutcome, EngineError> {
        require_nonzero(supplied)?;
        let path = self.check_swap_pair(funds, &to)?;
        let deadline = self.host.block_time();

        let amounts = match funds {
            Funds::Token { asset } => {
                self.host
                    .pull(&asset, &self.caller, supplied)
                    .map_err(EngineError::TransferFailed)?;
                self.host
                    .approve_router(&asset, supplied)
                    .map_err(EngineError::TransferFailed)?;
                let amounts = self
                    .host
                    .execute_exact_input(ExactInputOrder {
                        path: &path,
                        amount_in: supplied,
                        min_amount_out: Amount::ZERO,
                        recipient: Holder::Custody,
                        deadline,
                        funding: Funding::Allowance,
                    })
                    .map_err(EngineError::SwapFailed)?;
                self.revoke_unused_allowance(&asset)?;
                amounts
            }
            Funds::Native { attached } => {
                if attached != supplied {
                    return Err(EngineError::AttachedValueMismatch {
                        attached,
                        expected: supplied,
                    });
                }
                self.host
                    .receive_native(&self.caller, attached)
                    .map_err(EngineError::TransferFailed)?;
                self.host
                    .execute_exact_input(ExactInputOrder {
                        path: &path,
                        amount_in: supplied,
                        min_amount_out: Amount::ZERO,
                        recipient: Holder::Custody,
                        deadline,
                        funding: Funding::Native(supplied),
                    })
                    .map_err(EngineError::SwapFailed)?
            }
        };

        verify_amounts(&path, &amounts)?;
        if amounts[0] != supplied {
            return Err(EngineError::QuoteInconsistency(format!(
                "router consumed {} of an exact input of {supplied}",
                amounts[0]
            )));
        }
        let realized = amounts[amounts.len() - 1];

        self.ledger.credit(&self.caller, &to, realized)?;
        tracing::debug!(
            depositor = %self.caller,
            pool = %to,
            hops = path.len() - 1,
            amount_in = %supplied,
            amount_out = %realized,
            "exact-input swap executed"
        );
        Ok(SwapOutcome {
            path,
            amount_in: supplied,
            amount_out: realized,
            refunded: Amount::ZERO,
        })
    }
}

/// Input the router consumed, once its reported amounts check out.
fn checked_exact_output(
    path: &[AssetId],
    amounts: &[Amount],
    desired: Amount,
    max_in: Amount,
) -> Result<Amount, EngineError> {
    verify_amounts(path, amounts)?;
    let delivered = amounts[amounts.len() - 1];
    if delivered != desired {
        return Err(EngineError::QuoteInconsistency(format!(
            "router delivered {delivered} of an exact output of {desired}"
        )));
    }
    if amounts[0] > max_in {
        return Err(EngineError::InsufficientInput {
            needed: amounts[0],
            supplied: max_in,
        });
    }
    Ok(amounts[0])
}
