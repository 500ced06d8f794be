//! Reusable executor and demo fixtures.
//!
//! - [`MockWorld`]: a deterministic step executor with per-participant
//!   positions, a step counter standing in for the RNG index, and
//!   injectable divergence.
//! - [`single_player_demo`]: raw bytes of a small vanilla demo.

use ticsync_core::{
    CommandBatch, DesyncReport, FingerprintSource, ParticipantId, StepExecutor, MAX_PARTICIPANTS,
};

/// Deterministic simulation stand-in.
///
/// Each executed step moves every in-game participant's entity by its
/// forward move. Entities spawn at x = 0 the first time their slot is in
/// game. The RNG index advances by one per step.
#[derive(Clone, Debug, Default)]
pub struct MockWorld {
    positions: [Option<i32>; MAX_PARTICIPANTS],
    rng_index: u8,
    executed: Vec<CommandBatch>,
    desyncs: Vec<DesyncReport>,
    perturb: Option<(usize, ParticipantId, i32)>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nudge `participant`'s entity by `delta` during the `execution`-th
    /// executed step (zero-based), simulating a replica divergence.
    pub fn diverge_at(mut self, execution: usize, participant: ParticipantId, delta: i32) -> Self {
        self.perturb = Some((execution, participant, delta));
        self
    }

    /// Every batch executed so far, in order.
    pub fn executed(&self) -> &[CommandBatch] {
        &self.executed
    }

    /// Divergences reported through [`StepExecutor::on_desync`].
    pub fn desyncs(&self) -> &[DesyncReport] {
        &self.desyncs
    }

    pub fn position(&self, participant: ParticipantId) -> Option<i32> {
        self.positions.get(participant.index()).copied().flatten()
    }
}

impl FingerprintSource for MockWorld {
    fn entity_x(&self, participant: ParticipantId) -> Option<i32> {
        self.position(participant)
    }

    fn rng_index(&self) -> u8 {
        self.rng_index
    }
}

impl StepExecutor for MockWorld {
    fn execute(&mut self, batch: &CommandBatch) -> &dyn FingerprintSource {
        for slot in 0..MAX_PARTICIPANTS {
            if !batch.in_game[slot] {
                continue;
            }
            let x = self.positions[slot].unwrap_or(0);
            self.positions[slot] = Some(x + batch.commands[slot].forward_move as i32);
        }
        if let Some((at, p, delta)) = self.perturb {
            if at == self.executed.len() {
                if let Some(x) = self.positions[p.index()].as_mut() {
                    *x += delta;
                }
            }
        }
        self.rng_index = self.rng_index.wrapping_add(1);
        self.executed.push(*batch);
        self
    }

    fn on_desync(&mut self, report: &DesyncReport) {
        self.desyncs.push(*report);
    }
}

/// A version-109, single-participant demo whose tics carry the given
/// forward moves, terminated by the end marker.
pub fn single_player_demo(forward_moves: &[i8]) -> Vec<u8> {
    // version, skill, episode, map, deathmatch, respawn, fast,
    // nomonsters, console player, in_game x4
    let mut bytes = vec![109, 2, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0];
    for &f in forward_moves {
        bytes.extend_from_slice(&[f as u8, 0, 0, 0]);
    }
    bytes.push(0x80);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(slots: &[usize], forward: i8) -> CommandBatch {
        let mut b = CommandBatch::default();
        for &s in slots {
            b.in_game[s] = true;
            b.commands[s].forward_move = forward;
        }
        b
    }

    #[test]
    fn world_moves_in_game_entities() {
        let mut world = MockWorld::new();
        world.execute(&batch(&[0, 1], 10));
        world.execute(&batch(&[0], 5));
        assert_eq!(world.position(ParticipantId(0)), Some(15));
        assert_eq!(world.position(ParticipantId(1)), Some(10));
        assert_eq!(world.position(ParticipantId(2)), None);
        assert_eq!(world.rng_index(), 2);
        assert_eq!(world.executed().len(), 2);
    }

    #[test]
    fn divergence_applies_once() {
        let mut world = MockWorld::new().diverge_at(1, ParticipantId(0), 3);
        for _ in 0..3 {
            world.execute(&batch(&[0], 1));
        }
        assert_eq!(world.position(ParticipantId(0)), Some(6));
    }

    #[test]
    fn demo_fixture_layout() {
        let bytes = single_player_demo(&[10, 20]);
        assert_eq!(bytes.len(), 13 + 8 + 1);
        assert_eq!(bytes[13], 10);
        assert_eq!(bytes[17], 20);
        assert_eq!(*bytes.last().unwrap(), 0x80);
    }
}
