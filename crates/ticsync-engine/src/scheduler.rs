//! Per-frame scheduling decisions.
//!
//! The frame driver in [`session`](crate::session) asks this module two
//! questions: how many produced units to run this frame
//! ([`choose_counts`]), and how many new units the local builder should
//! attempt ([`ProductionTimer::due`]). The legacy policy additionally
//! runs a [`LegacySmoother`] that nudges production timing to track the
//! reference participant.

use ticsync_core::{ParticipantId, MAX_PARTICIPANTS};

/// Timing policy, fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Run everything available each frame; lookahead caps of 2 (offline)
    /// or 8 (networked) units.
    #[default]
    Bounded,
    /// Catch up gradually relative to real time, with a frame-skip
    /// smoother in networked sessions; lookahead cap of 5 units.
    LegacyAdaptive,
}

/// Produced units to run this frame.
///
/// `real_elapsed` is the number of wall-clock units since the previous
/// frame and `available` the number of units ready everywhere. The result
/// is at least 1; the caller waits until that many are available.
pub fn choose_counts(policy: Policy, real_elapsed: i64, available: i64) -> i64 {
    let counts = match policy {
        Policy::Bounded => available,
        Policy::LegacyAdaptive => {
            if real_elapsed < available - 1 {
                real_elapsed + 1
            } else if real_elapsed < available {
                real_elapsed
            } else {
                available
            }
        }
    };
    counts.max(1)
}

// ── Production timing ───────────────────────────────────────────

/// Tracks wall-clock units already turned into production attempts.
#[derive(Clone, Copy, Debug)]
pub struct ProductionTimer {
    last_units: i64,
    skip: i64,
}

impl ProductionTimer {
    /// Start counting from `now_units`.
    pub fn new(now_units: i64) -> Self {
        Self {
            last_units: now_units,
            skip: 0,
        }
    }

    /// Production attempts due at `now_units`, after any pending skip.
    ///
    /// Returns `(due, skipped)`.
    pub fn due(&mut self, now_units: i64) -> (i64, i64) {
        let elapsed = now_units - self.last_units;
        self.last_units = now_units;
        if self.skip <= elapsed {
            let skipped = self.skip;
            self.skip = 0;
            (elapsed - skipped, skipped)
        } else {
            self.skip -= elapsed;
            (0, elapsed.max(0))
        }
    }

    /// Pretend the last sample was one unit earlier, so one extra unit
    /// becomes due.
    pub fn nudge(&mut self) {
        self.last_units -= 1;
    }

    /// Drop the next `units` due production units.
    pub fn skip(&mut self, units: i64) {
        self.skip = units;
    }

    /// Units still pending a skip.
    pub fn pending_skip(&self) -> i64 {
        self.skip
    }
}

// ── Legacy smoother ─────────────────────────────────────────────

/// Adjustment decided by one [`LegacySmoother::observe`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmootherAction {
    /// Apply [`ProductionTimer::nudge`].
    pub nudge: bool,
    /// Apply `ProductionTimer::skip(1)`.
    pub skip: bool,
}

/// Rolling frame-skip history for the legacy networked policy.
///
/// The reference participant is the first occupied slot; it never adapts.
/// Every other participant nudges its production clock when it is not
/// ahead of the slowest peer, and skips one production unit after four
/// consecutive frames in which its previous production cursor was ahead
/// of the slowest peer.
#[derive(Clone, Debug, Default)]
pub struct LegacySmoother {
    frame: u64,
    history: [bool; 4],
    previous_produced: u64,
}

impl LegacySmoother {
    /// Fresh history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the history for this frame.
    pub fn observe(
        &mut self,
        local: ParticipantId,
        in_game: &[bool; MAX_PARTICIPANTS],
        produced: u64,
        lowest: u64,
    ) -> SmootherAction {
        self.frame += 1;

        let Some(reference) = in_game.iter().position(|&b| b) else {
            return SmootherAction::default();
        };
        if local.index() == reference {
            return SmootherAction::default();
        }

        let mut action = SmootherAction {
            nudge: produced <= lowest,
            skip: false,
        };
        self.history[(self.frame & 3) as usize] = self.previous_produced > lowest;
        self.previous_produced = produced;
        if self.history.iter().all(|&b| b) {
            action.skip = true;
        }
        action
    }

    /// The current four-frame history.
    pub fn history(&self) -> [bool; 4] {
        self.history
    }
}
