use proptest::prelude::*;

use offset_ledger::{CustodyLedger, LedgerSnapshot};
use offset_types::{Amount, AssetId, DepositorId};

#[derive(Clone, Debug)]
enum Op {
    Credit { depositor: u8, asset: u8, amount: u128 },
    Debit { depositor: u8, asset: u8, amount: u128 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 0u8..3, 0u128..1_000).prop_map(|(depositor, asset, amount)| Op::Credit {
            depositor,
            asset,
            amount
        }),
        (0u8..4, 0u8..3, 0u128..1_000).prop_map(|(depositor, asset, amount)| Op::Debit {
            depositor,
            asset,
            amount
        }),
    ]
}

fn apply(ledger: &mut CustodyLedger, op: &Op) -> bool {
    match *op {
        Op::Credit { depositor, asset, amount } => ledger
            .credit(&DepositorId::new([depositor; 20]), &AssetId::new([asset; 20]), Amount::new(amount))
            .is_ok(),
        Op::Debit { depositor, asset, amount } => ledger
            .debit(&DepositorId::new([depositor; 20]), &AssetId::new([asset; 20]), Amount::new(amount))
            .is_ok(),
    }
}

proptest! {
    /// Totals always equal the sum of entries, whatever mix of credits and
    /// (possibly failing) debits is applied.
    #[test]
    fn totals_match_entries(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut ledger = CustodyLedger::new();
        for op in &ops {
            apply(&mut ledger, op);
        }
        for a in 0u8..3 {
            let asset = AssetId::new([a; 20]);
            let summed: Amount = ledger
                .entries()
                .filter(|(_, entry_asset, _)| **entry_asset == asset)
                .map(|(_, _, amount)| amount)
                .sum();
            prop_assert_eq!(ledger.total_for(&asset), summed);
        }
    }

    /// A rejected debit leaves the ledger bit-for-bit unchanged.
    #[test]
    fn rejected_debit_is_a_no_op(
        ops in prop::collection::vec(op_strategy(), 0..32),
        depositor in 0u8..4,
        asset in 0u8..3,
    ) {
        let mut ledger = CustodyLedger::new();
        for op in &ops {
            apply(&mut ledger, op);
        }
        let d = DepositorId::new([depositor; 20]);
        let a = AssetId::new([asset; 20]);
        let held = ledger.balance_of(&d, &a);
        let before = LedgerSnapshot::capture(&ledger);

        let over = Amount::new(held.raw() + 1);
        prop_assert!(ledger.debit(&d, &a, over).is_err());
        prop_assert_eq!(LedgerSnapshot::capture(&ledger), before);
    }

    /// Dropping a transaction after arbitrary staged work restores nothing
    /// because nothing was ever applied.
    #[test]
    fn uncommitted_transaction_never_leaks(
        setup in prop::collection::vec(op_strategy(), 0..16),
        staged in prop::collection::vec(op_strategy(), 0..16),
    ) {
        let mut ledger = CustodyLedger::new();
        for op in &setup {
            apply(&mut ledger, op);
        }
        let before = LedgerSnapshot::capture(&ledger);
        {
            let mut txn = ledger.begin();
            for op in &staged {
                let _ = match *op {
                    Op::Credit { depositor, asset, amount } => txn.credit(
                        &DepositorId::new([depositor; 20]),
                        &AssetId::new([asset; 20]),
                        Amount::new(amount),
                    ),
                    Op::Debit { depositor, asset, amount } => txn.debit(
                        &DepositorId::new([depositor; 20]),
                        &AssetId::new([asset; 20]),
                        Amount::new(amount),
                    ),
                };
            }
        }
        prop_assert_eq!(LedgerSnapshot::capture(&ledger), before);
    }
}
