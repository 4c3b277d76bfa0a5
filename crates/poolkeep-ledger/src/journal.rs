//! Append-only audit journal.
//!
//! Each record's digest is
//! `SHA-256(domain || prev_digest || sequence_le || json(event))`, chaining
//! every record to all records before it.

use chrono::Utc;
use poolkeep_types::{AuditRecord, EventId, PoolError, PoolEvent, Result, constants};
use sha2::{Digest, Sha256};

/// Hash-chained list of committed audit records.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    records: Vec<AuditRecord>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest of the latest record, or the genesis digest when empty.
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.records
            .last()
            .map_or(constants::GENESIS_DIGEST, |r| r.digest)
    }

    #[must_use]
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append every event of one committed call. On error nothing is appended.
    pub fn append_all(&mut self, events: Vec<PoolEvent>) -> Result<Vec<AuditRecord>> {
        let mut prev = self.head();
        let mut sequence = self.records.len() as u64;
        let mut staged = Vec::with_capacity(events.len());
        for event in events {
            let digest = compute_digest(&prev, sequence, &event)?;
            tracing::trace!(
                sequence,
                kind = %event.kind(),
                actor = %event.actor().short(),
                asset = ?event.asset(),
                "Audit record staged"
            );
            staged.push(AuditRecord {
                id: EventId::new(),
                sequence,
                recorded_at: Utc::now(),
                event,
                prev_digest: prev,
                digest,
            });
            prev = digest;
            sequence += 1;
        }
        self.records.extend(staged.iter().cloned());
        Ok(staged)
    }

    /// Recompute every digest and check the chain links.
    ///
    /// # Errors
    /// `Internal` naming the first broken record.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev = constants::GENESIS_DIGEST;
        for (position, record) in self.records.iter().enumerate() {
            let expected_seq = position as u64;
            if record.sequence != expected_seq || record.prev_digest != prev {
                return Err(PoolError::Internal(format!(
                    "journal link broken at record {position}"
                )));
            }
            let digest = compute_digest(&prev, record.sequence, &record.event)?;
            if digest != record.digest {
                return Err(PoolError::Internal(format!(
                    "journal digest mismatch at record {position}: stored {}, computed {}",
                    record.digest_hex(),
                    hex::encode(digest),
                )));
            }
            prev = digest;
        }
        Ok(())
    }
}

fn compute_digest(prev: &[u8; 32], sequence: u64, event: &PoolEvent) -> Result<[u8; 32]> {
    let payload = serde_json::to_vec(event)?;
    let mut hasher = Sha256::new();
    hasher.update(constants::AUDIT_DOMAIN);
    hasher.update(prev);
    hasher.update(sequence.to_le_bytes());
    hasher.update(&payload);
    Ok(hasher.finalize().into())
}
