//! Collaborator traits: the narrow interface between the scheduler and
//! the rest of the application.
//!
//! The scheduler never blocks, renders, or simulates. It samples input
//! through [`InputSource`], exchanges commands through [`NetworkLink`],
//! measures time through [`FrameClock`], and hands finalized batches to a
//! [`StepExecutor`], reading fingerprints back through
//! [`FingerprintSource`].

use crate::command::{CommandBatch, CommandRecord};
use crate::error::{DesyncReport, SessionError};
use crate::id::{ParticipantId, StepId};

/// Wall-clock time source for the frame driver.
pub trait FrameClock {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_ms(&mut self) -> u64;

    /// Yield briefly while the scheduler waits for production.
    ///
    /// Real clocks sleep about one millisecond; test clocks advance.
    fn idle(&mut self) {}
}

/// Live input devices.
pub trait InputSource {
    /// Poll devices and service menus. Called once per production
    /// attempt, including in observer mode.
    fn service(&mut self) {}

    /// Snapshot the current input state as the command for produced
    /// unit `step`.
    fn sample(&mut self, step: StepId) -> CommandRecord;
}

/// Write access to remote participants' slots of the step ring.
///
/// Handed to [`NetworkLink::poll`]; the engine implements it over its
/// ring and cursor set.
pub trait CommandInbox {
    /// Store `command` as `participant`'s input for produced unit `step`.
    ///
    /// Deliveries must arrive in order per participant.
    fn deliver(
        &mut self,
        participant: ParticipantId,
        step: StepId,
        command: CommandRecord,
    ) -> Result<(), SessionError>;

    /// Mark `participant` as gone for every future produced unit.
    fn remove_participant(&mut self, participant: ParticipantId);
}

/// Network transport. All methods are non-blocking.
pub trait NetworkLink {
    /// Opportunistically receive remote commands into `inbox`.
    fn poll(&mut self, inbox: &mut dyn CommandInbox) -> Result<(), SessionError>;

    /// Transmit the local command for produced unit `step`.
    fn send(&mut self, _step: StepId, _command: &CommandRecord) {}

    /// Latency correction applied by the networked timing policy.
    fn clock_offset_ms(&self) -> i32 {
        0
    }
}

/// The no-op transport used by single-participant sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl NetworkLink for Offline {
    fn poll(&mut self, _inbox: &mut dyn CommandInbox) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Per-participant world state the consistency auditor fingerprints.
pub trait FingerprintSource {
    /// Horizontal position of the participant's entity, if it exists.
    fn entity_x(&self, participant: ParticipantId) -> Option<i32>;

    /// Shared pseudo-random generator index, used as the fingerprint for
    /// participants that have no entity yet.
    fn rng_index(&self) -> u8;
}

/// The opaque simulation.
pub trait StepExecutor {
    /// Run one logical step with `batch` and expose the resulting state.
    fn execute(&mut self, batch: &CommandBatch) -> &dyn FingerprintSource;

    /// Called once when the session fails with a consistency divergence,
    /// before the error is returned to the frame driver.
    fn on_desync(&mut self, _report: &DesyncReport) {}
}
