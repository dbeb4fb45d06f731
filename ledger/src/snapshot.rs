//! Ledger snapshots: capture every balance at a point in time.
//!
//! A snapshot is ordered by (depositor, asset) and hashed deterministically,
//! so two snapshots of identical ledgers have identical hashes. Workflows use
//! them to show that a rolled-back operation left the ledger exactly as it
//! found it.

use crate::custody::CustodyLedger;
use crate::error::LedgerError;
use offset_types::{Amount, AssetId, DepositorId};
use serde::{Deserialize, Serialize};

/// One ledger entry captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub depositor: DepositorId,
    pub asset: AssetId,
    pub amount: Amount,
}

/// A ledger snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 over the entries.
    pub hash: [u8; 32],
    pub entries: Vec<EntrySnapshot>,
    /// Snapshot format version.
    pub version: u32,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &CustodyLedger) -> Self {
        let entries = ledger
            .entries()
            .map(|(depositor, asset, amount)| EntrySnapshot {
                depositor: *depositor,
                asset: *asset,
                amount,
            })
            .collect();
        let mut snap = Self {
            hash: [0u8; 32],
            entries,
            version: 1,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        for entry in &self.entries {
            hasher.update(entry.depositor.as_bytes());
            hasher.update(entry.asset.as_bytes());
            hasher.update(entry.amount.raw().to_le_bytes());
        }
        hasher.update(self.version.to_le_bytes());

        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    /// Verify the hash matches the entries.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Rebuild a ledger from this snapshot.
    pub fn restore(&self) -> Result<CustodyLedger, LedgerError> {
        let mut ledger = CustodyLedger::new();
        for entry in &self.entries {
            ledger.credit(&entry.depositor, &entry.asset, entry.amount)?;
        }
        Ok(ledger)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
