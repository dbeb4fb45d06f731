//! Append-only audit journal of redemptions and retirements.
//!
//! Events are staged while a workflow runs and only reach the journal when
//! the workflow commits, so a rolled-back workflow leaves no trace here.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use offset_types::{Amount, AssetId, DepositorId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blake2b-256 identifier of a journal record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId([u8; 32]);

impl RecordId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", hex::encode(&self.0[..6]))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&s).map_err(|e| format!("{s}: {e}"))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("{s}: expected 32 bytes, got {}", b.len()))?;
        Ok(Self(bytes))
    }
}

/// Something auditable that happened inside a committed workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A pool asset was exchanged for certificate assets.
    Redeemed {
        depositor: DepositorId,
        pool: AssetId,
        certificates: Vec<AssetId>,
        amounts: Vec<Amount>,
    },
    /// A certificate asset was permanently consumed.
    Retired {
        depositor: DepositorId,
        certificate: AssetId,
        amount: Amount,
        /// Pool the certificate was redeemed from within the same workflow.
        pool: Option<AssetId>,
    },
}

impl AuditEvent {
    pub fn depositor(&self) -> &DepositorId {
        match self {
            Self::Redeemed { depositor, .. } | Self::Retired { depositor, .. } => depositor,
        }
    }

    fn digest(&self, seq: u64) -> RecordId {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(seq.to_le_bytes());
        match self {
            Self::Redeemed {
                depositor,
                pool,
                certificates,
                amounts,
            } => {
                hasher.update([0u8]);
                hasher.update(depositor.as_bytes());
                hasher.update(pool.as_bytes());
                hasher.update((certificates.len() as u64).to_le_bytes());
                for (certificate, amount) in certificates.iter().zip(amounts) {
                    hasher.update(certificate.as_bytes());
                    hasher.update(amount.raw().to_le_bytes());
                }
            }
            Self::Retired {
                depositor,
                certificate,
                amount,
                pool,
            } => {
                hasher.update([1u8]);
                hasher.update(depositor.as_bytes());
                hasher.update(certificate.as_bytes());
                hasher.update(amount.raw().to_le_bytes());
                match pool {
                    Some(pool) => {
                        hasher.update([1u8]);
                        hasher.update(pool.as_bytes());
                    }
                    None => hasher.update([0u8]),
                }
            }
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        RecordId(out)
    }
}

/// A journaled event. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub seq: u64,
    pub id: RecordId,
    pub event: AuditEvent,
}

impl AuditRecord {
    /// Whether the id still matches the record's contents.
    pub fn verify(&self) -> bool {
        self.id == self.event.digest(self.seq)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuditJournal {
    records: Vec<AuditRecord>,
}

impl AuditJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append committed events in order. Returns their sequence numbers.
    pub fn append(&mut self, events: Vec<AuditEvent>) -> Vec<u64> {
        let mut seqs = Vec::with_capacity(events.len());
        for event in events {
            let seq = self.records.len() as u64;
            let id = event.digest(seq);
            tracing::debug!(seq, %id, "audit record appended");
            self.records.push(AuditRecord { seq, id, event });
            seqs.push(seq);
        }
        seqs
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Records appended at or after `seq`.
    pub fn since(&self, seq: u64) -> &[AuditRecord] {
        let start = usize::try_from(seq).unwrap_or(usize::MAX).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total of `certificate` retired by `depositor` across the journal.
    pub fn retired_by(&self, depositor: &DepositorId, certificate: &AssetId) -> Amount {
        self.records
            .iter()
            .filter_map(|r| match &r.event {
                AuditEvent::Retired {
                    depositor: d,
                    certificate: c,
                    amount,
                    ..
                } if d == depositor && c == certificate => Some(*amount),
                _ => None,
            })
            .sum()
    }
}
