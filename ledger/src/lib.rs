//! Custody ledger.
//!
//! The single source of truth for how much of each asset every depositor
//! currently has available inside the aggregator. Balances are never
//! negative: a debit larger than the balance is an error, not a clamp.
//!
//! Mutations made during a workflow go through a [`LedgerTxn`], which stages
//! new balances on top of the committed ledger. Committing applies them;
//! dropping the transaction discards them, leaving the ledger untouched.

pub mod custody;
pub mod error;
pub mod snapshot;
pub mod txn;

pub use custody::CustodyLedger;
pub use error::LedgerError;
pub use snapshot::{EntrySnapshot, LedgerSnapshot};
pub use txn::LedgerTxn;
