//! The composite offset workflows as one parameterised pipeline.
//!
//! Every variant ends the same way (redeem the pool amount, retire the
//! certificates it produced); they differ only in how the pool amount is
//! obtained. The pipeline runs inside the aggregator's atomic runner, which
//! is the single place rollback happens.

use crate::context::WorkflowContext;
use crate::error::EngineError;
use crate::planner::Payment;
use crate::retire::Retirement;
use crate::swap::{Funds, SwapOutcome};
use offset_registry::EligibilitySnapshot;
use offset_services::Host;
use offset_types::{Amount, AssetId, Capability, DepositorId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the caller sizes the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sizing {
    /// Retire exactly this much, paying whatever it costs.
    ExactOutput(Amount),
    /// Spend exactly this much, retiring whatever it buys.
    ExactInput(Amount),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Workflow {
    /// Caller pays with the pool asset itself: deposit, redeem, retire.
    Passthrough { pool: AssetId, amount: Amount },
    /// Attached native value buys exactly `amount_out` of the pool; leftover value is refunded.
    ExactOutputNative {
        pool: AssetId,
        amount_out: Amount,
        attached: Amount,
    },
    /// All attached native value is swapped and the realized amount retired.
    ExactInputNative { pool: AssetId, attached: Amount },
    /// A token buys exactly `amount_out` of the pool; unconsumed token is returned.
    ExactOutputToken {
        token: AssetId,
        pool: AssetId,
        amount_out: Amount,
    },
    /// Exactly `amount_in` of a token is swapped and the realized amount retired.
    ExactInputToken {
        token: AssetId,
        pool: AssetId,
        amount_in: Amount,
    },
}

impl Workflow {
    /// Map a (payment, target pool, sizing) request onto its variant.
    ///
    /// `attached` is the native value sent with the invocation; it must be
    /// zero unless the caller pays natively.
    pub fn select(
        payment: Payment,
        attached: Amount,
        pool: AssetId,
        sizing: Sizing,
        snapshot: &EligibilitySnapshot,
    ) -> Result<Self, EngineError> {
        match payment {
            Payment::Native => match sizing {
                Sizing::ExactOutput(amount_out) => Ok(Self::ExactOutputNative {
                    pool,
                    amount_out,
                    attached,
                }),
                Sizing::ExactInput(amount_in) if amount_in != attached => {
                    Err(EngineError::AttachedValueMismatch {
                        attached,
                        expected: amount_in,
                    })
                }
                Sizing::ExactInput(_) => Ok(Self::ExactInputNative { pool, attached }),
            },
            Payment::Token(_) if !attached.is_zero() => Err(EngineError::AttachedValueMismatch {
                attached,
                expected: Amount::ZERO,
            }),
            Payment::Token(token) if snapshot.is_redeemable(&token) => {
                if token != pool {
                    return Err(EngineError::IneligibleAsset {
                        asset: token,
                        required: Capability::Swappable,
                    });
                }
                let amount = match sizing {
                    Sizing::ExactOutput(a) | Sizing::ExactInput(a) => a,
                };
                Ok(Self::Passthrough { pool, amount })
            }
            Payment::Token(token) if snapshot.is_swappable(&token) => Ok(match sizing {
                Sizing::ExactOutput(amount_out) => Self::ExactOutputToken {
                    token,
                    pool,
                    amount_out,
                },
                Sizing::ExactInput(amount_in) => Self::ExactInputToken {
                    token,
                    pool,
                    amount_in,
                },
            }),
            Payment::Token(token) => Err(EngineError::IneligibleAsset {
                asset: token,
                required: Capability::Swappable,
            }),
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        match self {
            Self::Passthrough { .. } => WorkflowKind::Passthrough,
            Self::ExactOutputNative { .. } => WorkflowKind::ExactOutputNative,
            Self::ExactInputNative { .. } => WorkflowKind::ExactInputNative,
            Self::ExactOutputToken { .. } => WorkflowKind::ExactOutputToken,
            Self::ExactInputToken { .. } => WorkflowKind::ExactInputToken,
        }
    }

    pub fn pool(&self) -> AssetId {
        match self {
            Self::Passthrough { pool, .. }
            | Self::ExactOutputNative { pool, .. }
            | Self::ExactInputNative { pool, .. }
            | Self::ExactOutputToken { pool, .. }
            | Self::ExactInputToken { pool, .. } => *pool,
        }
    }

    /// Native value the invocation carries.
    pub fn attached(&self) -> Amount {
        match self {
            Self::ExactOutputNative { attached, .. } | Self::ExactInputNative { attached, .. } => *attached,
            _ => Amount::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Passthrough,
    ExactOutputNative,
    ExactInputNative,
    ExactOutputToken,
    ExactInputToken,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::ExactOutputNative => "exact_output_native",
            Self::ExactInputNative => "exact_input_native",
            Self::ExactOutputToken => "exact_output_token",
            Self::ExactInputToken => "exact_input_token",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a committed workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowReceipt {
    pub kind: WorkflowKind,
    pub depositor: DepositorId,
    pub pool: AssetId,
    /// The conversion step, absent for passthrough.
    pub swap: Option<SwapOutcome>,
    /// Pool amount redeemed.
    pub redeemed: Amount,
    /// Certificate identifiers actually retired, parallel to `amounts`.
    pub certificates: Vec<AssetId>,
    pub amounts: Vec<Amount>,
    /// Journal sequence numbers of the records this workflow produced.
    pub records: Vec<u64>,
}

impl WorkflowReceipt {
    pub fn total_retired(&self) -> Amount {
        self.amounts.iter().sum()
    }
}

impl<'a, H: Host + ?Sized> WorkflowContext<'a, H> {
    pub(crate) fn run_pipeline(&mut self, workflow: Workflow) -> Result<WorkflowReceipt, EngineError> {
        let pool = workflow.pool();
        let (swap, redeem_amount) = match workflow {
            Workflow::Passthrough { pool, amount } => {
                self.deposit(pool, amount)?;
                (None, amount)
            }
            Workflow::ExactOutputNative {
                pool,
                amount_out,
                attached,
            } => {
                let outcome = self.swap_exact_output(Funds::Native { attached }, pool, amount_out)?;
                (Some(outcome), amount_out)
            }
            Workflow::ExactInputNative { pool, attached } => {
                let outcome = self.swap_exact_input(Funds::Native { attached }, attached, pool)?;
                let realized = outcome.amount_out;
                (Some(outcome), realized)
            }
            Workflow::ExactOutputToken {
                token,
                pool,
                amount_out,
            } => {
                let outcome = self.swap_exact_output(Funds::Token { asset: token }, pool, amount_out)?;
                (Some(outcome), amount_out)
            }
            Workflow::ExactInputToken {
                token,
                pool,
                amount_in,
            } => {
                let outcome = self.swap_exact_input(Funds::Token { asset: token }, amount_in, pool)?;
                let realized = outcome.amount_out;
                (Some(outcome), realized)
            }
        };

        let redemption = self.auto_redeem(pool, redeem_amount)?;
        let retired = self.auto_retire(&redemption.certificates, &redemption.amounts, Some(pool))?;
        let (certificates, amounts): (Vec<AssetId>, Vec<Amount>) = retired
            .into_iter()
            .map(|Retirement { certificate, amount }| (certificate, amount))
            .unzip();

        Ok(WorkflowReceipt {
            kind: workflow.kind(),
            depositor: self.caller,
            pool,
            swap,
            redeemed: redeem_amount,
            certificates,
            amounts,
            records: Vec::new(),
        })
    }
}
