//! Fixed-capacity ring of per-step command batches.
//!
//! [`StepRing`] is addressed by produced-unit index modulo capacity and is
//! never resized. Producers write a slot before the consumer reads it;
//! the consumer clears a slot once its unit has run so the slot starts
//! empty when the ring wraps back onto it.

use ticsync_core::{CommandBatch, CommandRecord, ParticipantId};

/// Circular buffer of [`CommandBatch`] slots.
#[derive(Clone, Debug)]
pub struct StepRing {
    slots: Vec<CommandBatch>,
}

impl StepRing {
    /// Create a ring with `capacity` empty slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`. Session configs are validated against a
    /// much larger minimum before a ring is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "StepRing capacity must be >= 2, got {capacity}");
        Self {
            slots: vec![CommandBatch::default(); capacity],
        }
    }

    fn index(&self, unit: u64) -> usize {
        (unit % self.slots.len() as u64) as usize
    }

    /// The batch for produced unit `unit`.
    pub fn batch(&self, unit: u64) -> &CommandBatch {
        &self.slots[self.index(unit)]
    }

    /// Mutable access to the batch for produced unit `unit`.
    pub fn batch_mut(&mut self, unit: u64) -> &mut CommandBatch {
        let i = self.index(unit);
        &mut self.slots[i]
    }

    /// Store `participant`'s command for `unit` and mark the slot occupied.
    pub fn write(&mut self, unit: u64, participant: ParticipantId, command: CommandRecord) {
        let batch = self.batch_mut(unit);
        batch.commands[participant.index()] = command;
        batch.in_game[participant.index()] = true;
    }

    /// Replace the whole batch for `unit`.
    pub fn write_batch(&mut self, unit: u64, batch: CommandBatch) {
        *self.batch_mut(unit) = batch;
    }

    /// Empty the slot for `unit`.
    pub fn release(&mut self, unit: u64) {
        self.batch_mut(unit).clear();
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(forward: i8) -> CommandRecord {
        CommandRecord {
            forward_move: forward,
            ..CommandRecord::default()
        }
    }

    #[test]
    fn test_ring_new_empty() {
        let ring = StepRing::new(16);
        assert_eq!(ring.capacity(), 16);
        for unit in 0..16 {
            assert!(!ring.batch(unit).any_in_game());
        }
    }

    #[test]
    #[should_panic(expected = "capacity must be >= 2")]
    fn test_ring_rejects_tiny_capacity() {
        StepRing::new(1);
    }

    #[test]
    fn test_ring_write_marks_occupied() {
        let mut ring = StepRing::new(16);
        ring.write(3, ParticipantId(1), cmd(7));
        let batch = ring.batch(3);
        assert!(batch.in_game[1]);
        assert!(!batch.in_game[0]);
        assert_eq!(batch.commands[1].forward_move, 7);
    }

    #[test]
    fn test_ring_wraps_modulo_capacity() {
        let mut ring = StepRing::new(16);
        ring.write(5, ParticipantId(0), cmd(1));
        assert_eq!(ring.batch(21).commands[0].forward_move, 1);
        ring.write(21, ParticipantId(0), cmd(2));
        assert_eq!(ring.batch(5).commands[0].forward_move, 2);
    }

    #[test]
    fn test_ring_release_clears_slot() {
        let mut ring = StepRing::new(16);
        ring.write(0, ParticipantId(0), cmd(9));
        ring.write(0, ParticipantId(2), cmd(9));
        ring.release(0);
        assert_eq!(*ring.batch(0), CommandBatch::default());
        assert_eq!(*ring.batch(16), CommandBatch::default());
    }

    #[test]
    fn test_ring_write_batch_replaces() {
        let mut ring = StepRing::new(16);
        ring.write(2, ParticipantId(3), cmd(4));
        let mut batch = CommandBatch::default();
        batch.in_game[0] = true;
        ring.write_batch(2, batch);
        assert!(ring.batch(2).in_game[0]);
        assert!(!ring.batch(2).in_game[3]);
    }
}
