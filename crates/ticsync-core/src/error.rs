//! Error types for a running step-scheduling session.
//!
//! Recoverable conditions (production backpressure, a frame with nothing
//! to run) are not errors: they surface as "not produced" and as a
//! stalled frame report. Everything in [`SessionError`] is fatal for the
//! session that returned it.

use std::error::Error;
use std::fmt;

use crate::id::{ParticipantId, StepId};

/// Details of a fingerprint mismatch between two replicas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DesyncReport {
    /// The participant whose fingerprint diverged.
    pub participant: ParticipantId,
    /// The produced unit whose command carried the fingerprint.
    pub step: StepId,
    /// Fingerprint carried inside the participant's command.
    pub found: u8,
    /// Fingerprint this replica computed for the same ring slot.
    pub expected: u8,
}

impl fmt::Display for DesyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "consistency failure (found {}, expected {}) for participant {} at step {}",
            self.found, self.expected, self.participant, self.step
        )
    }
}

/// Fatal errors from driving a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The earliest step produced by every participant fell behind the
    /// consumption cursor. Production must never trail consumption.
    ConsumptionAhead {
        /// Produced units already consumed.
        consumed: u64,
        /// Lowest production cursor across active participants.
        lowest: u64,
    },
    /// Replicas diverged: a fingerprint did not match.
    ConsistencyFailure(DesyncReport),
    /// A remote command arrived out of order, for an unknown slot, or too
    /// far ahead of the consumer.
    InvalidDelivery {
        /// Slot the delivery targeted.
        participant: ParticipantId,
        /// Produced unit the delivery targeted.
        step: StepId,
        /// Why it was refused.
        reason: &'static str,
    },
    /// The playback stream ended mid-record or is otherwise malformed.
    StreamCorrupt {
        /// Byte offset of the failed read.
        offset: usize,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The session already returned a fatal error and cannot continue.
    Terminated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsumptionAhead { consumed, lowest } => write!(
                f,
                "lowest available step {lowest} is behind consumption cursor {consumed}"
            ),
            Self::ConsistencyFailure(report) => write!(f, "{report}"),
            Self::InvalidDelivery {
                participant,
                step,
                reason,
            } => write!(
                f,
                "refused delivery for participant {participant} at step {step}: {reason}"
            ),
            Self::StreamCorrupt { offset, detail } => {
                write!(f, "command stream corrupt at byte {offset}: {detail}")
            }
            Self::Terminated => write!(f, "session terminated after a fatal error"),
        }
    }
}

impl Error for SessionError {}

impl From<DesyncReport> for SessionError {
    fn from(report: DesyncReport) -> Self {
        Self::ConsistencyFailure(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desync_message_names_both_fingerprints() {
        let err = SessionError::from(DesyncReport {
            participant: ParticipantId(1),
            step: StepId(300),
            found: 7,
            expected: 9,
        });
        let msg = err.to_string();
        assert!(msg.starts_with("consistency failure (found 7, expected 9)"), "{msg}");
        assert!(msg.contains("participant 1"));
        assert!(msg.contains("step 300"));
    }

    #[test]
    fn consumption_ahead_reports_indices() {
        let err = SessionError::ConsumptionAhead {
            consumed: 12,
            lowest: 11,
        };
        assert_eq!(
            err.to_string(),
            "lowest available step 11 is behind consumption cursor 12"
        );
    }
}
