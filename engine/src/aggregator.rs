//! The caller-facing aggregator and its atomic runner.

use crate::config::{AggregatorConfig, ConfigError};
use crate::context::{require_nonzero, WorkflowContext};
use crate::error::EngineError;
use crate::planner::{ConversionPlanner, Payment, Quote, Routing};
use crate::records::{AuditEvent, AuditJournal};
use crate::retire::Retirement;
use crate::swap::{Funds, SwapOutcome};
use crate::workflow::{Sizing, Workflow, WorkflowReceipt};
use offset_ledger::{CustodyLedger, LedgerSnapshot};
use offset_registry::{EligibilityRegistry, EligibilitySnapshot};
use offset_services::{Checkpoint, Host, Redemption};
use offset_types::{Amount, AssetId, Capability, DepositorId};
use offset_utils::StatsCounter;

pub const STAT_COMMITTED: &str = "workflows_committed";
pub const STAT_REVERTED: &str = "workflows_reverted";
pub const STAT_UNITS_RETIRED: &str = "certificate_units_retired";

/// Offset aggregator bound to one execution environment.
///
/// Every mutating operation runs through [`atomically`](Self::atomically):
/// the host is checkpointed, the ledger change is staged, and either both
/// are kept or both are thrown away. No step performs its own compensation.
pub struct OffsetAggregator<H> {
    host: H,
    registry: EligibilityRegistry,
    planner: ConversionPlanner,
    ledger: CustodyLedger,
    journal: AuditJournal,
    stats: StatsCounter,
}

impl<H: Host> OffsetAggregator<H> {
    pub fn new(host: H, registry: EligibilityRegistry, routing: Routing) -> Self {
        Self {
            host,
            registry,
            planner: ConversionPlanner::new(routing),
            ledger: CustodyLedger::new(),
            journal: AuditJournal::new(),
            stats: StatsCounter::new(&[STAT_COMMITTED, STAT_REVERTED, STAT_UNITS_RETIRED]),
        }
    }

    pub fn from_config(config: &AggregatorConfig, host: H) -> Result<Self, ConfigError> {
        let registry = config.build_registry()?;
        let routing = config.routing(&registry)?;
        Ok(Self::new(host, registry, routing))
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct access to the environment, outside of any workflow.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &EligibilityRegistry {
        &self.registry
    }

    /// Administrative access to the allow-list. Workflows already running
    /// hold their own snapshot, so edits only affect later invocations.
    pub fn registry_mut(&mut self) -> &mut EligibilityRegistry {
        &mut self.registry
    }

    pub fn snapshot(&self) -> EligibilitySnapshot {
        self.registry.snapshot()
    }

    pub fn planner(&self) -> &ConversionPlanner {
        &self.planner
    }

    pub fn ledger(&self) -> &CustodyLedger {
        &self.ledger
    }

    pub fn ledger_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.ledger)
    }

    pub fn balance_of(&self, depositor: &DepositorId, asset: &AssetId) -> Amount {
        self.ledger.balance_of(depositor, asset)
    }

    pub fn journal(&self) -> &AuditJournal {
        &self.journal
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    // ── Workflows ──────────────────────────────────────────────────────

    /// Run one composite workflow to completion or not at all.
    pub fn offset(&mut self, caller: DepositorId, workflow: Workflow) -> Result<WorkflowReceipt, EngineError> {
        let (mut receipt, records) =
            self.atomically(caller, workflow.kind().as_str(), |cx| cx.run_pipeline(workflow))?;
        receipt.records = records;
        Ok(receipt)
    }

    /// Select the workflow for a (payment, pool, sizing) request and run it.
    pub fn offset_with(
        &mut self,
        caller: DepositorId,
        payment: Payment,
        attached: Amount,
        pool: AssetId,
        sizing: Sizing,
    ) -> Result<WorkflowReceipt, EngineError> {
        let workflow = Workflow::select(payment, attached, pool, sizing, &self.registry.snapshot())?;
        self.offset(caller, workflow)
    }

    // ── Single steps ───────────────────────────────────────────────────

    pub fn deposit(&mut self, caller: DepositorId, asset: AssetId, amount: Amount) -> Result<Amount, EngineError> {
        self.atomically(caller, "deposit", |cx| cx.deposit(asset, amount))
            .map(|(balance, _)| balance)
    }

    pub fn withdraw(&mut self, caller: DepositorId, asset: AssetId, amount: Amount) -> Result<Amount, EngineError> {
        self.atomically(caller, "withdraw", |cx| cx.withdraw(asset, amount))
            .map(|(balance, _)| balance)
    }

    pub fn swap_exact_output(
        &mut self,
        caller: DepositorId,
        funds: Funds,
        pool: AssetId,
        desired: Amount,
    ) -> Result<SwapOutcome, EngineError> {
        self.atomically(caller, "swap_exact_output", |cx| cx.swap_exact_output(funds, pool, desired))
            .map(|(outcome, _)| outcome)
    }

    pub fn swap_exact_input(
        &mut self,
        caller: DepositorId,
        funds: Funds,
        supplied: Amount,
        pool: AssetId,
    ) -> Result<SwapOutcome, EngineError> {
        self.atomically(caller, "swap_exact_input", |cx| cx.swap_exact_input(funds, supplied, pool))
            .map(|(outcome, _)| outcome)
    }

    pub fn auto_redeem(&mut self, caller: DepositorId, pool: AssetId, amount: Amount) -> Result<Redemption, EngineError> {
        self.atomically(caller, "redeem", |cx| cx.auto_redeem(pool, amount))
            .map(|(redemption, _)| redemption)
    }

    pub fn auto_retire(
        &mut self,
        caller: DepositorId,
        certificates: &[AssetId],
        amounts: &[Amount],
    ) -> Result<Vec<Retirement>, EngineError> {
        self.atomically(caller, "retire", |cx| cx.auto_retire(certificates, amounts, None))
            .map(|(retired, _)| retired)
    }

    // ── Read-only quotes ───────────────────────────────────────────────

    /// Payment needed for exactly `amount_out` of `pool`.
    pub fn quote_needed_input(&self, payment: Payment, pool: AssetId, amount_out: Amount) -> Result<Quote, EngineError> {
        let path = self.quote_path(payment, pool, amount_out)?;
        self.planner.quote_exact_output(&self.host, &path, amount_out)
    }

    /// Pool amount expected for exactly `amount_in` of payment.
    pub fn quote_expected_output(&self, payment: Payment, pool: AssetId, amount_in: Amount) -> Result<Quote, EngineError> {
        let path = self.quote_path(payment, pool, amount_in)?;
        self.planner.quote_exact_input(&self.host, &path, amount_in)
    }

    fn quote_path(&self, payment: Payment, pool: AssetId, amount: Amount) -> Result<Vec<AssetId>, EngineError> {
        require_nonzero(amount)?;
        let snapshot = self.registry.snapshot();
        if let Payment::Token(token) = payment {
            if !snapshot.is_swappable(&token) {
                return Err(EngineError::IneligibleAsset {
                    asset: token,
                    required: Capability::Swappable,
                });
            }
        }
        if !snapshot.is_redeemable(&pool) {
            return Err(EngineError::IneligibleAsset {
                asset: pool,
                required: Capability::Redeemable,
            });
        }
        Ok(self.planner.plan_path(self.planner.source_of(payment), pool))
    }

    // ── Atomic runner ──────────────────────────────────────────────────

    /// Run `step` against a frozen registry snapshot, a staged ledger and a
    /// checkpointed host. On success the custody invariant is checked, then
    /// the host effects are kept, the ledger committed and the staged audit
    /// events journaled. On any error the host is reverted to the checkpoint
    /// and the staged ledger is dropped.
    ///
    /// Returns the step's value and the journal sequence numbers it produced.
    fn atomically<T>(
        &mut self,
        caller: DepositorId,
        operation: &'static str,
        step: impl FnOnce(&mut WorkflowContext<'_, H>) -> Result<T, EngineError>,
    ) -> Result<(T, Vec<u64>), EngineError> {
        let snapshot = self.registry.snapshot();
        let checkpoint = self.host.checkpoint();
        let mut cx = WorkflowContext {
            host: &mut self.host,
            ledger: self.ledger.begin(),
            snapshot: &snapshot,
            planner: &self.planner,
            caller,
            events: Vec::new(),
        };

        let outcome = step(&mut cx).and_then(|value| cx.verify_custody().map(|()| value));
        match outcome {
            Ok(value) => {
                if let Err(source) = cx.host.release(checkpoint) {
                    drop(cx);
                    return Err(self.roll_back(checkpoint, operation, caller, EngineError::Environment(source)));
                }
                let WorkflowContext { ledger, events, .. } = cx;
                ledger.commit();

                let retired = events
                    .iter()
                    .filter_map(|event| match event {
                        AuditEvent::Retired { amount, .. } => Some(amount.raw()),
                        AuditEvent::Redeemed { .. } => None,
                    })
                    .fold(0u128, u128::saturating_add);
                let records = self.journal.append(events);
                self.stats.increment(STAT_COMMITTED);
                self.stats
                    .add(STAT_UNITS_RETIRED, u64::try_from(retired).unwrap_or(u64::MAX));

                tracing::info!(
                    operation,
                    depositor = %caller,
                    registry_version = snapshot.version(),
                    records = records.len(),
                    retired = %Amount::new(retired),
                    "operation committed"
                );
                Ok((value, records))
            }
            Err(err) => {
                drop(cx);
                Err(self.roll_back(checkpoint, operation, caller, err))
            }
        }
    }

    /// Revert the host to `checkpoint` after `err` aborted an operation.
    /// The staged ledger must already be dropped.
    fn roll_back(
        &mut self,
        checkpoint: Checkpoint,
        operation: &'static str,
        caller: DepositorId,
        err: EngineError,
    ) -> EngineError {
        self.stats.increment(STAT_REVERTED);
        match self.host.revert_to(checkpoint) {
            Ok(()) => {
                tracing::warn!(operation, depositor = %caller, error = %err, "operation rolled back");
                err
            }
            Err(source) => {
                tracing::error!(
                    operation,
                    depositor = %caller,
                    error = %err,
                    revert_error = %source,
                    "operation aborted and rollback failed"
                );
                EngineError::RollbackFailed {
                    reason: Box::new(err),
                    source,
                }
            }
        }
    }
}
