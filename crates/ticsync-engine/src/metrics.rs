//! Cumulative scheduling counters for a session.
//!
//! [`SessionMetrics`] is updated in place by the frame driver and can be
//! read at any time through [`Session::metrics`](crate::Session::metrics).

/// Counters accumulated since the session began.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Calls to `drive_one_frame` that reached the scheduler.
    pub frames_driven: u64,
    /// Logical steps handed to the executor.
    pub steps_executed: u64,
    /// Frames that returned without running anything because production
    /// had not caught up within the wait budget.
    pub stalled_frames: u64,
    /// Production attempts refused by the lookahead cap.
    pub deferred_productions: u64,
    /// Production steps dropped by the legacy frame-skip smoother.
    pub skipped_production_steps: u64,
    /// One-step clock nudges applied by the legacy smoother.
    pub slow_down_nudges: u64,
    /// Duplicated sub-steps whose batch was squashed.
    pub squashed_substeps: u64,
    /// Produced units checked by the consistency auditor.
    pub audited_steps: u64,
}
