//! Cross-replica consistency checking.
//!
//! Every replica keeps a fingerprint per (participant, ring slot). The
//! local builder stamps its own row into each command it produces, and
//! every replica compares incoming stamps against its own row for that
//! participant one ring cycle later.

use ticsync_core::{
    CommandBatch, DesyncReport, FingerprintSource, ParticipantId, StepId, MAX_PARTICIPANTS,
};

/// Fingerprint table plus the check and record operations.
#[derive(Clone, Debug)]
pub struct ConsistencyAuditor {
    table: Vec<[u8; MAX_PARTICIPANTS]>,
}

/// Fingerprint of `participant` in `world`: the low byte of its entity's
/// x position, or the shared RNG index before the entity exists.
pub fn fingerprint(world: &dyn FingerprintSource, participant: ParticipantId) -> u8 {
    match world.entity_x(participant) {
        Some(x) => (x & 0xff) as u8,
        None => world.rng_index(),
    }
}

impl ConsistencyAuditor {
    /// An all-zero table with one row per ring slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            table: vec![[0; MAX_PARTICIPANTS]; capacity],
        }
    }

    fn row(&self, unit: u64) -> usize {
        (unit % self.table.len() as u64) as usize
    }

    /// The value a command produced for `unit` by `participant` carries.
    pub fn stamp(&self, participant: ParticipantId, unit: u64) -> u8 {
        self.table[self.row(unit)][participant.index()]
    }

    /// Compare every occupied slot's carried stamp with this replica's
    /// fingerprint for the same slot.
    ///
    /// Units within the first ring cycle are never checked: their table
    /// rows have not been filled by both replicas yet.
    pub fn check(&self, unit: u64, batch: &CommandBatch) -> Result<(), DesyncReport> {
        if unit <= self.table.len() as u64 {
            return Ok(());
        }
        let row = &self.table[self.row(unit)];
        for participant in batch.active_participants() {
            let found = batch.command(participant).consistency;
            let expected = row[participant.index()];
            if found != expected {
                return Err(DesyncReport {
                    participant,
                    step: StepId(unit),
                    found,
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Store fresh fingerprints for every slot occupied in `batch`.
    pub fn record(&mut self, unit: u64, batch: &CommandBatch, world: &dyn FingerprintSource) {
        let row = self.row(unit);
        for participant in batch.active_participants() {
            self.table[row][participant.index()] = fingerprint(world, participant);
        }
    }
}
