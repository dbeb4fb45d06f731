//! Committed ledger state.

use crate::error::LedgerError;
use crate::txn::LedgerTxn;
use offset_types::{Amount, AssetId, DepositorId};
use std::collections::BTreeMap;

/// Committed per-depositor, per-asset balances plus per-asset totals.
///
/// Entries exist only while non-zero. `totals[asset]` always equals the sum
/// of that asset's entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustodyLedger {
    pub(crate) balances: BTreeMap<(DepositorId, AssetId), Amount>,
    pub(crate) totals: BTreeMap<AssetId, Amount>,
}

impl CustodyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, depositor: &DepositorId, asset: &AssetId) -> Amount {
        self.balances
            .get(&(*depositor, *asset))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of every depositor's balance of `asset`.
    pub fn total_for(&self, asset: &AssetId) -> Amount {
        self.totals.get(asset).copied().unwrap_or(Amount::ZERO)
    }

    /// All non-zero entries, ordered by (depositor, asset).
    pub fn entries(&self) -> impl Iterator<Item = (&DepositorId, &AssetId, Amount)> {
        self.balances.iter().map(|((d, a), amount)| (d, a, *amount))
    }

    /// Non-zero balances held by one depositor.
    pub fn holdings_of(&self, depositor: &DepositorId) -> Vec<(AssetId, Amount)> {
        self.balances
            .range((*depositor, AssetId::new([0; 20]))..=(*depositor, AssetId::new([0xff; 20])))
            .map(|((_, asset), amount)| (*asset, *amount))
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Credit outside of a transaction. Returns the new balance.
    pub fn credit(
        &mut self,
        depositor: &DepositorId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let mut txn = self.begin();
        let balance = txn.credit(depositor, asset, amount)?;
        txn.commit();
        Ok(balance)
    }

    /// Debit outside of a transaction. Returns the new balance.
    pub fn debit(
        &mut self,
        depositor: &DepositorId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let mut txn = self.begin();
        let balance = txn.debit(depositor, asset, amount)?;
        txn.commit();
        Ok(balance)
    }

    /// Start staging mutations.
    pub fn begin(&mut self) -> LedgerTxn<'_> {
        LedgerTxn::new(self)
    }

    /// Fail if the ledger records more of `asset` than custody actually holds.
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

    /// Write a staged balance back; zero removes the entry.
    pub(crate) fn apply_balance(&mut self, depositor: DepositorId, asset: AssetId, balance: Amount) {
        if balance.is_zero() {
            self.balances.remove(&(depositor, asset));
        } else {
            self.balances.insert((depositor, asset), balance);
        }
    }

    /// Write a staged per-asset total back; zero removes the entry.
    pub(crate) fn apply_total(&mut self, asset: AssetId, total: Amount) {
        if total.is_zero() {
            self.totals.remove(&asset);
        } else {
            self.totals.insert(asset, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depositor(n: u8) -> DepositorId {
        DepositorId::new([n; 20])
    }

    fn asset(n: u8) -> AssetId {
        AssetId::new([n; 20])
    }

    #[test]
    fn credit_creates_entry_and_total() {
        let mut ledger = CustodyLedger::new();
        let balance = ledger.credit(&depositor(1), &asset(9), Amount::new(50)).unwrap();
        assert_eq!(balance, Amount::new(50));
        assert_eq!(ledger.total_for(&asset(9)), Amount::new(50));
        assert_eq!(ledger.entry_count(), 1);
    }

    #[test]
    fn full_debit_removes_entry() {
        let mut ledger = CustodyLedger::new();
        ledger.credit(&depositor(1), &asset(9), Amount::new(50)).unwrap();
        ledger.debit(&depositor(1), &asset(9), Amount::new(50)).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_for(&asset(9)), Amount::ZERO);
    }

    #[test]
    fn overdraw_fails_and_leaves_balance() {
        let mut ledger = CustodyLedger::new();
        ledger.credit(&depositor(1), &asset(9), Amount::new(10)).unwrap();
        let err = ledger.debit(&depositor(1), &asset(9), Amount::new(11)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                depositor: depositor(1),
                asset: asset(9),
                needed: Amount::new(11),
                available: Amount::new(10),
            }
        );
        assert_eq!(ledger.balance_of(&depositor(1), &asset(9)), Amount::new(10));
    }

    #[test]
    fn totals_sum_across_depositors() {
        let mut ledger = CustodyLedger::new();
        ledger.credit(&depositor(1), &asset(9), Amount::new(10)).unwrap();
        ledger.credit(&depositor(2), &asset(9), Amount::new(15)).unwrap();
        ledger.debit(&depositor(1), &asset(9), Amount::new(4)).unwrap();
        assert_eq!(ledger.total_for(&asset(9)), Amount::new(21));
    }

    #[test]
    fn holdings_of_only_returns_that_depositor() {
        let mut ledger = CustodyLedger::new();
        ledger.credit(&depositor(1), &asset(3), Amount::new(1)).unwrap();
        ledger.credit(&depositor(1), &asset(4), Amount::new(2)).unwrap();
        ledger.credit(&depositor(2), &asset(3), Amount::new(5)).unwrap();
        assert_eq!(
            ledger.holdings_of(&depositor(1)),
            vec![(asset(3), Amount::new(1)), (asset(4), Amount::new(2))]
        );
    }

    #[test]
    fn custody_check() {
        let mut ledger = CustodyLedger::new();
        ledger.credit(&depositor(1), &asset(9), Amount::new(10)).unwrap();
        assert!(ledger.check_custody(&asset(9), Amount::new(10)).is_ok());
        assert!(ledger.check_custody(&asset(9), Amount::new(12)).is_ok());
        assert!(matches!(
            ledger.check_custody(&asset(9), Amount::new(9)),
            Err(LedgerError::CustodyExceeded { .. })
        ));
    }
}
