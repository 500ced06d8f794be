//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the input to [`Session::begin`](crate::Session::begin).
//! [`validate()`](SessionConfig::validate) checks structural invariants
//! once at session start; nothing is re-checked per frame.

use std::error::Error;
use std::fmt;

use ticsync_core::{ParticipantId, MAX_PARTICIPANTS};
use ticsync_demo::GameParams;

use crate::scheduler::Policy;

/// Default ring capacity in produced units.
pub const BACKUPTICS: usize = 128;

/// Smallest ring capacity a session accepts.
pub const MIN_RING_CAPACITY: usize = 16;

/// Largest accepted duplication factor.
pub const MAX_STEP_DUP: u32 = 9;

/// Default per-frame wait budget, in logical steps.
pub const DEFAULT_STALL_BUDGET: u32 = 5;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `step_dup` is zero or above [`MAX_STEP_DUP`].
    InvalidStepDup {
        /// The configured value.
        value: u32,
    },
    /// `local_index` does not name a participant slot.
    LocalIndexOutOfRange {
        /// The configured value.
        value: u8,
    },
    /// The ring is below [`MIN_RING_CAPACITY`].
    RingTooSmall {
        /// The configured size that was too small.
        configured: usize,
    },
    /// No participant slot is occupied.
    NoParticipants,
    /// A producing (non-observer) session whose local slot is unoccupied.
    LocalNotParticipant {
        /// The local slot.
        local: ParticipantId,
    },
    /// An offline session listing participants other than the local one.
    OfflineRemoteParticipant {
        /// The first remote slot found.
        participant: ParticipantId,
    },
    /// Observer mode requires a network link to receive commands from.
    OfflineDrone,
    /// Observer mode produces nothing, so single-step mode cannot advance.
    DroneSingleStep,
    /// Single-step mode runs without waiting for the network, so it is
    /// offline only.
    NetworkedSingleStep,
    /// The stall budget is zero.
    ZeroStallBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStepDup { value } => {
                write!(f, "step_dup must be in 1..={MAX_STEP_DUP}, got {value}")
            }
            Self::LocalIndexOutOfRange { value } => write!(
                f,
                "local_index {value} out of range (max participants {MAX_PARTICIPANTS})"
            ),
            Self::RingTooSmall { configured } => write!(
                f,
                "ring_capacity {configured} is below minimum of {MIN_RING_CAPACITY}"
            ),
            Self::NoParticipants => write!(f, "no participant slot is occupied"),
            Self::LocalNotParticipant { local } => {
                write!(f, "local participant {local} is not marked as a participant")
            }
            Self::OfflineRemoteParticipant { participant } => write!(
                f,
                "participant {participant} is remote but the session is not networked"
            ),
            Self::OfflineDrone => write!(f, "drone mode requires a networked session"),
            Self::DroneSingleStep => write!(f, "drone mode cannot be combined with single_step"),
            Self::NetworkedSingleStep => {
                write!(f, "single_step requires an offline session")
            }
            Self::ZeroStallBudget => write!(f, "stall_budget_steps must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── SessionConfig ──────────────────────────────────────────────────

/// Everything fixed at session start.
///
/// # Examples
///
/// ```
/// use ticsync_engine::{Policy, SessionConfig};
///
/// let config = SessionConfig {
///     policy: Policy::LegacyAdaptive,
///     ..SessionConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.lookahead_cap(), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Timing policy. Default: [`Policy::Bounded`].
    pub policy: Policy,
    /// Logical steps per produced unit. Default: 1.
    pub step_dup: u32,
    /// This process's participant slot. Default: 0.
    pub local_index: u8,
    /// Occupied participant slots at session start. Default: local only.
    pub participants: [bool; MAX_PARTICIPANTS],
    /// Whether a network peer is connected. Default: false.
    pub networked: bool,
    /// Observer mode: poll input but never produce local commands.
    pub drone: bool,
    /// Produce exactly one unit per frame regardless of the clock.
    pub single_step: bool,
    /// Quantize turn deltas to 8-bit granularity with carried error.
    pub low_res_turn: bool,
    /// Record demos with expanded (16-bit) turn resolution.
    pub long_tics: bool,
    /// Ring capacity in produced units. Default: [`BACKUPTICS`].
    pub ring_capacity: usize,
    /// Wall-clock steps a frame may wait for production before giving up.
    /// Default: [`DEFAULT_STALL_BUDGET`].
    pub stall_budget_steps: u32,
    /// Growth increment of the demo recording buffer, in bytes.
    pub demo_growth_bytes: usize,
    /// Game parameters written into recorded demo headers.
    pub game: GameParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Bounded,
            step_dup: 1,
            local_index: 0,
            participants: [true, false, false, false],
            networked: false,
            drone: false,
            single_step: false,
            low_res_turn: false,
            long_tics: false,
            ring_capacity: BACKUPTICS,
            stall_budget_steps: DEFAULT_STALL_BUDGET,
            demo_growth_bytes: ticsync_demo::DEFAULT_GROWTH_BYTES,
            game: GameParams::default(),
        }
    }
}

impl SessionConfig {
    /// The local participant slot.
    pub fn local(&self) -> ParticipantId {
        ParticipantId(self.local_index)
    }

    /// How many produced units the local builder may run ahead of the
    /// consumer.
    pub fn lookahead_cap(&self) -> u64 {
        match (self.policy, self.networked) {
            (Policy::Bounded, false) => 2,
            (Policy::Bounded, true) => 8,
            (Policy::LegacyAdaptive, _) => 5,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_dup == 0 || self.step_dup > MAX_STEP_DUP {
            return Err(ConfigError::InvalidStepDup {
                value: self.step_dup,
            });
        }
        if self.local_index as usize >= MAX_PARTICIPANTS {
            return Err(ConfigError::LocalIndexOutOfRange {
                value: self.local_index,
            });
        }
        if self.ring_capacity < MIN_RING_CAPACITY {
            return Err(ConfigError::RingTooSmall {
                configured: self.ring_capacity,
            });
        }
        if self.stall_budget_steps == 0 {
            return Err(ConfigError::ZeroStallBudget);
        }
        if !self.participants.iter().any(|&b| b) {
            return Err(ConfigError::NoParticipants);
        }
        if self.drone {
            if !self.networked {
                return Err(ConfigError::OfflineDrone);
            }
            if self.single_step {
                return Err(ConfigError::DroneSingleStep);
            }
        } else if !self.participants[self.local_index as usize] {
            return Err(ConfigError::LocalNotParticipant {
                local: self.local(),
            });
        }
        if self.networked && self.single_step {
            return Err(ConfigError::NetworkedSingleStep);
        }
        if !self.networked {
            let remote = (0..MAX_PARTICIPANTS)
                .find(|&i| i != self.local_index as usize && self.participants[i]);
            if let Some(i) = remote {
                return Err(ConfigError::OfflineRemoteParticipant {
                    participant: ParticipantId(i as u8),
                });
            }
        }
        Ok(())
    }
}
