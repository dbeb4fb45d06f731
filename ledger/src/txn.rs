//! Staged ledger mutations.

use crate::custody::CustodyLedger;
use crate::error::LedgerError;
use offset_types::{Amount, AssetId, DepositorId};
use std::collections::BTreeMap;

/// A set of balance changes staged on top of a [`CustodyLedger`].
///
/// Reads see the staged value when there is one and fall through to the
/// committed ledger otherwise. Nothing reaches the ledger until
/// [`commit`](Self::commit); dropping the transaction discards every
/// staged change.
#[must_use = "a ledger transaction discards its changes unless committed"]
pub struct LedgerTxn<'a> {
    base: &'a mut CustodyLedger,
    balances: BTreeMap<(DepositorId, AssetId), Amount>,
    totals: BTreeMap<AssetId, Amount>,
}

impl<'a> LedgerTxn<'a> {
    pub(crate) fn new(base: &'a mut CustodyLedger) -> Self {
        Self {
            base,
            balances: BTreeMap::new(),
            totals: BTreeMap::new(),
        }
    }

    pub fn balance_of(&self, depositor: &DepositorId, asset: &AssetId) -> Amount {
        self.balances
            .get(&(*depositor, *asset))
            .copied()
            .unwrap_or_else(|| self.base.balance_of(depositor, asset))
    }

    pub fn total_for(&self, asset: &AssetId) -> Amount {
        self.totals
            .get(asset)
            .copied()
            .unwrap_or_else(|| self.base.total_for(asset))
    }

    /// Stage a credit. Returns the staged balance.
    pub fn credit(
        &mut self,
        depositor: &DepositorId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let overflow = || LedgerError::Overflow { asset: *asset };
        let balance = self
            .balance_of(depositor, asset)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let total = self.total_for(asset).checked_add(amount).ok_or_else(overflow)?;
        self.balances.insert((*depositor, *asset), balance);
        self.totals.insert(*asset, total);
        Ok(balance)
    }

    /// Stage a debit. Fails without staging anything if the balance is short.
    pub fn debit(
        &mut self,
        depositor: &DepositorId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let available = self.balance_of(depositor, asset);
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                depositor: *depositor,
                asset: *asset,
                needed: amount,
                available,
            })?;
        // Every balance is part of its total, so the total cannot underflow.
        let total = self.total_for(asset).saturating_sub(amount);
        self.balances.insert((*depositor, *asset), balance);
        self.totals.insert(*asset, total);
        Ok(balance)
    }

    /// Assets whose totals this transaction has changed.
    pub fn touched_assets(&self) -> Vec<AssetId> {
        self.totals.keys().copied().collect()
    }

    /// Check one asset's staged total against what custody actually holds.
    pub fn check_custody(&self, asset: &AssetId, held: Amount) -> Result<(), LedgerError> {
        let recorded = self.total_for(asset);
        if recorded > held {
            return Err(LedgerError::CustodyExceeded {
                asset: *asset,
                recorded,
                held,
            });
        }
        Ok(())
    }

    /// Number of staged balance changes.
    pub fn staged_len(&self) -> usize {
        self.balances.len()
    }

    /// Apply every staged change to the ledger.
    pub fn commit(self) {
        let staged = self.balances.len();
        for ((depositor, asset), balance) in self.balances {
            self.base.apply_balance(depositor, asset, balance);
        }
        for (asset, total) in self.totals {
            self.base.apply_total(asset, total);
        }
        tracing::trace!(staged, "ledger transaction committed");
    }
}
