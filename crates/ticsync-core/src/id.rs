//! Strongly-typed identifiers for participants and logical steps.

use std::fmt;

use crate::command::MAX_PARTICIPANTS;

/// Identifies a participant slot in a session (`0..MAX_PARTICIPANTS`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u8);

impl ParticipantId {
    /// The slot index as a `usize`, for indexing batches and tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this id names an existing slot.
    pub fn is_valid(self) -> bool {
        self.index() < MAX_PARTICIPANTS
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ParticipantId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Monotonically increasing step counter.
///
/// Depending on context this counts produced units (ring positions) or
/// logical steps (produced units times the duplication factor); APIs
/// that take a `StepId` say which.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
