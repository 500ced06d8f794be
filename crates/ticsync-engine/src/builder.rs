//! Local command production.
//!
//! [`CommandBuilder`] owns the local production cursor. Each call to
//! [`produce`](CommandBuilder::produce) samples one command, stamps it,
//! optionally quantizes its turn delta, transmits it, and writes it into
//! the ring, unless the lookahead cap says the consumer is too far
//! behind.

use ticsync_core::{
    CommandBatch, CommandRecord, InputSource, NetworkLink, ParticipantId, StepId,
};

use crate::ring::StepRing;

/// Outcome of one production attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Production {
    /// A unit was written to the ring.
    Produced(StepId),
    /// The lookahead cap was reached; retry on a later frame.
    Deferred,
    /// Nothing to produce (observer mode, or a finished playback stream).
    Idle,
}

impl Production {
    /// Whether a unit was written.
    pub fn is_produced(self) -> bool {
        matches!(self, Self::Produced(_))
    }
}

/// The local production cursor and its per-session settings.
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    local: ParticipantId,
    next_to_produce: u64,
    lookahead_cap: u64,
    quantize: bool,
    recording: bool,
    turn_carry: i16,
}

impl CommandBuilder {
    /// A builder for `local` that may run `lookahead_cap` produced units
    /// ahead of the consumer.
    pub fn new(local: ParticipantId, lookahead_cap: u64) -> Self {
        Self {
            local,
            next_to_produce: 0,
            lookahead_cap,
            quantize: false,
            recording: false,
            turn_carry: 0,
        }
    }

    /// Enable or disable low-resolution turn quantization.
    pub fn set_quantize(&mut self, quantize: bool) {
        self.quantize = quantize;
    }

    /// While recording, a forward move equal to the demo end marker is
    /// produced as -127 so that every replica executes the stored value.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Whether turn quantization is active.
    pub fn quantizes(&self) -> bool {
        self.quantize
    }

    /// The next produced unit index.
    pub fn next_to_produce(&self) -> u64 {
        self.next_to_produce
    }

    /// Whether a unit may be produced while the consumer has finished
    /// `consumed_units` produced units.
    pub fn has_room(&self, consumed_units: u64) -> bool {
        self.next_to_produce.saturating_sub(consumed_units) < self.lookahead_cap
    }

    /// Round `cmd`'s turn delta to a multiple of 256, carrying the
    /// rounding error into the next call.
    pub fn quantize_turn(&mut self, cmd: &mut CommandRecord) {
        let desired = cmd.angle_turn.wrapping_add(self.turn_carry);
        cmd.angle_turn = desired.wrapping_add(128) & !0xff;
        self.turn_carry = desired.wrapping_sub(cmd.angle_turn);
    }

    /// Sample, stamp, send, and store one local command.
    pub fn produce(
        &mut self,
        ring: &mut StepRing,
        input: &mut dyn InputSource,
        network: &mut dyn NetworkLink,
        consumed_units: u64,
        stamp: impl FnOnce(u64) -> u8,
    ) -> Production {
        if !self.has_room(consumed_units) {
            return Production::Deferred;
        }

        let step = StepId(self.next_to_produce);
        let mut cmd = input.sample(step);
        cmd.consistency = stamp(step.0);
        if self.quantize {
            self.quantize_turn(&mut cmd);
        }
        if self.recording && cmd.forward_move == i8::MIN {
            cmd.forward_move = -127;
        }

        network.send(step, &cmd);
        ring.write(step.0, self.local, cmd);
        self.next_to_produce += 1;
        Production::Produced(step)
    }

    /// Store a batch read from another source (a playback stream) as the
    /// next produced unit.
    pub fn push_batch(
        &mut self,
        ring: &mut StepRing,
        batch: CommandBatch,
        consumed_units: u64,
    ) -> Production {
        if !self.has_room(consumed_units) {
            return Production::Deferred;
        }
        let step = StepId(self.next_to_produce);
        ring.write_batch(step.0, batch);
        self.next_to_produce += 1;
        Production::Produced(step)
    }
}
