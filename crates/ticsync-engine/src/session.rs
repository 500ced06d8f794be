//! The per-session frame driver.
//!
//! [`Session`] owns every piece of scheduling state: the step ring, the
//! production and consumption cursors, the remote receive cursors, the
//! fingerprint table, the legacy smoother and any active demo recorder or
//! player. The outer application calls
//! [`drive_one_frame()`](Session::drive_one_frame) once per real frame,
//! passing its collaborators in a [`FrameIo`].
//!
//! # Frame shape
//!
//! 1. Sample the clock and update production (network receive, then one
//!    local production attempt per elapsed unit).
//! 2. Choose how many produced units to run under the session's
//!    [`Policy`].
//! 3. Wait, bounded by the stall budget, until that many units are
//!    available from every participant.
//! 4. Run them, `step_dup` logical steps per unit, auditing, recording
//!    and squashing as configured, and update production between steps.
//!
//! Any error is fatal: the session is marked terminated and every later
//! frame returns [`SessionError::Terminated`].

use ticsync_core::{
    DesyncReport, FrameClock, InputSource, NetworkLink, ParticipantId, SessionError,
    StepExecutor, StepId, MAX_PARTICIPANTS,
};
use ticsync_demo::{DemoError, DemoHeader, DemoPlayer, DemoRecorder, TurnResolution};

use crate::audit::ConsistencyAuditor;
use crate::builder::{CommandBuilder, Production};
use crate::clock::ClockAdapter;
use crate::config::{ConfigError, SessionConfig};
use crate::inbox::{ParticipantCursors, RemoteInbox};
use crate::metrics::SessionMetrics;
use crate::ring::StepRing;
use crate::scheduler::{choose_counts, LegacySmoother, Policy, ProductionTimer};
use crate::squash::squash;

// Compile-time assertion: a Session can be moved to another thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Session>();
    }
};

// ── FrameIo / FrameReport ───────────────────────────────────────

/// The collaborators a frame needs, borrowed for one call.
pub struct FrameIo<'a> {
    /// Wall clock and idle yield.
    pub clock: &'a mut dyn FrameClock,
    /// Live input.
    pub input: &'a mut dyn InputSource,
    /// Network transport ([`Offline`](ticsync_core::Offline) when alone).
    pub network: &'a mut dyn NetworkLink,
    /// The simulation.
    pub executor: &'a mut dyn StepExecutor,
}

/// How a frame ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The chosen number of units ran.
    Ran,
    /// Production did not catch up within the wait budget; nothing ran.
    Stalled,
    /// The playback stream is exhausted and nothing is left to run.
    PlaybackEnded,
}

/// Result of one [`Session::drive_one_frame()`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Logical steps handed to the executor this frame.
    pub steps_executed: u64,
    /// How the frame ended.
    pub outcome: FrameOutcome,
}

impl FrameReport {
    fn new(steps_executed: u64, outcome: FrameOutcome) -> Self {
        Self {
            steps_executed,
            outcome,
        }
    }
}

struct Playback {
    player: DemoPlayer,
    ended: bool,
}

// ── Session ─────────────────────────────────────────────────────

/// A running step-scheduling session.
///
/// # Example
///
/// ```
/// use ticsync_core::Offline;
/// use ticsync_engine::{FrameIo, FrameOutcome, Session, SessionConfig};
/// use ticsync_test_utils::{ManualClock, MockWorld, ScriptedInput};
///
/// let mut session = Session::begin(SessionConfig::default(), 0).unwrap();
/// let mut clock = ManualClock::new();
/// let mut input = ScriptedInput::walking(25, 64);
/// let mut world = MockWorld::new();
///
/// clock.advance(1000);
/// let report = session
///     .drive_one_frame(&mut FrameIo {
///         clock: &mut clock,
///         input: &mut input,
///         network: &mut Offline,
///         executor: &mut world,
///     })
///     .unwrap();
/// assert_eq!(report.outcome, FrameOutcome::Ran);
/// assert!(report.steps_executed >= 1);
/// ```
pub struct Session {
    config: SessionConfig,
    clock: ClockAdapter,
    last_clock_ms: u64,
    ring: StepRing,
    cursors: ParticipantCursors,
    builder: CommandBuilder,
    auditor: ConsistencyAuditor,
    timer: ProductionTimer,
    smoother: LegacySmoother,
    last_frame_units: i64,
    next_to_consume: u64,
    last_in_game: [bool; MAX_PARTICIPANTS],
    recorder: Option<DemoRecorder>,
    playback: Option<Playback>,
    metrics: SessionMetrics,
    terminated: bool,
}

impl Session {
    /// Start a session whose clock reads zero steps at `start_ms`.
    pub fn begin(config: SessionConfig, start_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            policy = ?config.policy,
            step_dup = config.step_dup,
            local = %config.local(),
            networked = config.networked,
            drone = config.drone,
            "session started"
        );

        let mut builder = CommandBuilder::new(config.local(), config.lookahead_cap());
        builder.set_quantize(config.low_res_turn);
        Ok(Self {
            clock: ClockAdapter::new(start_ms),
            last_clock_ms: start_ms,
            ring: StepRing::new(config.ring_capacity),
            cursors: ParticipantCursors::new(config.participants, config.local()),
            builder,
            auditor: ConsistencyAuditor::new(config.ring_capacity),
            timer: ProductionTimer::new(0),
            smoother: LegacySmoother::new(),
            last_frame_units: 0,
            next_to_consume: 0,
            last_in_game: config.participants,
            recorder: None,
            playback: None,
            metrics: SessionMetrics::default(),
            terminated: false,
            config,
        })
    }

    /// Run one real-time frame.
    pub fn drive_one_frame(&mut self, io: &mut FrameIo<'_>) -> Result<FrameReport, SessionError> {
        if self.terminated {
            return Err(SessionError::Terminated);
        }
        match self.try_run_units(io) {
            Ok(report) => Ok(report),
            Err(e) => {
                self.terminated = true;
                tracing::warn!(error = %e, "session terminated");
                Err(e)
            }
        }
    }

    // ── Recording / playback ────────────────────────────────────

    /// Start recording every executed logical step into a demo.
    ///
    /// Without long tics, turn quantization is forced on so the live run
    /// produces exactly what the standard-resolution demo can store.
    pub fn begin_recording(&mut self) {
        let resolution = if self.config.long_tics {
            TurnResolution::Expanded
        } else {
            TurnResolution::Standard
        };
        let header = DemoHeader::for_recording(
            resolution,
            self.config.game,
            self.config.local_index,
            self.config.participants,
        );
        self.builder
            .set_quantize(self.config.low_res_turn || !self.config.long_tics);
        self.builder.set_recording(true);
        self.recorder = Some(DemoRecorder::with_growth(
            header,
            self.config.demo_growth_bytes,
        ));
        tracing::info!(version = header.version, "demo recording started");
    }

    /// Stop recording and return the finished demo, or `None` if no
    /// recording was active.
    pub fn end_recording(&mut self) -> Option<Vec<u8>> {
        let recorder = self.recorder.take()?;
        self.builder.set_quantize(self.config.low_res_turn);
        self.builder.set_recording(false);
        tracing::info!(tics = recorder.tics_recorded(), "demo recording ended");
        Some(recorder.finish())
    }

    /// Replace production with the tics stored in `bytes`.
    ///
    /// The session restarts from step zero with the demo's occupancy and
    /// console player, a duplication factor of 1, no network and no
    /// consistency checking.
    pub fn begin_playback(&mut self, bytes: Vec<u8>) -> Result<DemoHeader, DemoError> {
        let player = DemoPlayer::new(bytes)?;
        let header = *player.header();

        self.config.step_dup = 1;
        self.config.networked = false;
        self.config.drone = false;
        self.config.local_index = header.console_player;
        self.config.participants = header.in_game;

        let local = self.config.local();
        let capacity = self.config.ring_capacity;
        self.ring = StepRing::new(capacity);
        self.cursors = ParticipantCursors::new(header.in_game, local);
        self.builder = CommandBuilder::new(local, self.config.lookahead_cap());
        self.auditor = ConsistencyAuditor::new(capacity);
        self.smoother = LegacySmoother::new();
        let now = self.clock.steps_at(self.last_clock_ms, 0);
        self.timer = ProductionTimer::new(now);
        self.last_frame_units = now;
        self.next_to_consume = 0;
        self.last_in_game = header.in_game;
        self.playback = Some(Playback {
            player,
            ended: false,
        });

        tracing::info!(
            version = header.version,
            participants = header.participant_count(),
            console_player = header.console_player,
            "demo playback started"
        );
        Ok(header)
    }

    /// Report a divergence detected outside the session and terminate.
    ///
    /// Returns the error for the caller to propagate.
    pub fn report_desync(
        &mut self,
        participant: ParticipantId,
        expected: u8,
        found: u8,
    ) -> SessionError {
        let report = DesyncReport {
            participant,
            step: StepId(self.consumed_units()),
            found,
            expected,
        };
        tracing::warn!(%report, "consistency failure reported");
        self.terminated = true;
        SessionError::ConsistencyFailure(report)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The effective configuration (playback overrides included).
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Counters accumulated so far.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Next produced unit the local builder will write.
    pub fn next_to_produce(&self) -> u64 {
        self.builder.next_to_produce()
    }

    /// Next logical step to run.
    pub fn next_to_consume(&self) -> u64 {
        self.next_to_consume
    }

    /// Earliest produced unit not yet available from every participant.
    pub fn lowest_available(&self) -> u64 {
        self.lowest()
    }

    /// Whether a demo is being recorded.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Whether production comes from a demo.
    pub fn is_playing_back(&self) -> bool {
        self.playback.is_some()
    }

    /// Whether the playback stream has reached its end marker.
    pub fn playback_ended(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.ended)
    }

    /// Whether a fatal error has ended the session.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    // ── Cursor helpers ──────────────────────────────────────────

    fn step_dup(&self) -> u64 {
        self.config.step_dup as u64
    }

    fn consumed_units(&self) -> u64 {
        self.next_to_consume / self.step_dup()
    }

    fn lowest(&self) -> u64 {
        let produced = self.builder.next_to_produce();
        if !self.config.networked {
            return produced;
        }
        let local = (!self.config.drone).then_some(produced);
        self.cursors.lowest(local, self.consumed_units())
    }

    fn players_in_game(&self) -> bool {
        self.cursors.any_active()
    }

    fn auditing(&self) -> bool {
        self.config.networked && self.playback.is_none()
    }

    fn now_units(&mut self, clock: &mut dyn FrameClock, offset_ms: i32) -> i64 {
        self.last_clock_ms = clock.now_ms();
        self.clock.steps_at(self.last_clock_ms, offset_ms) / self.step_dup() as i64
    }

    // ── Production ──────────────────────────────────────────────

    /// Receive remote commands, then attempt one local production per
    /// wall-clock unit elapsed since the last update.
    fn update_production(&mut self, io: &mut FrameIo<'_>) -> Result<(), SessionError> {
        let consumed = self.consumed_units();
        {
            let mut inbox = RemoteInbox::new(&mut self.ring, &mut self.cursors, consumed);
            io.network.poll(&mut inbox)?;
        }

        let offset = if self.config.networked && self.config.policy == Policy::Bounded {
            io.network.clock_offset_ms()
        } else {
            0
        };
        let now = self.now_units(&mut *io.clock, offset);
        let (due, skipped) = self.timer.due(now);
        if skipped > 0 {
            self.metrics.skipped_production_steps += skipped as u64;
            tracing::debug!(skipped, "production steps skipped");
        }
        for _ in 0..due {
            if !self.produce_one(io)? && !self.config.drone {
                break;
            }
        }
        Ok(())
    }

    /// One production attempt. Returns whether a unit was written.
    fn produce_one(&mut self, io: &mut FrameIo<'_>) -> Result<bool, SessionError> {
        io.input.service();
        if self.config.drone {
            return Ok(false);
        }

        let consumed = self.consumed_units();
        let production = match self.playback.as_mut() {
            Some(playback) if playback.ended => Production::Idle,
            Some(_) if !self.builder.has_room(consumed) => Production::Deferred,
            Some(playback) => match playback.player.next_tic()? {
                Some(batch) => self.builder.push_batch(&mut self.ring, batch, consumed),
                None => {
                    playback.ended = true;
                    tracing::info!(
                        tics = playback.player.tics_read(),
                        "demo playback reached end marker"
                    );
                    Production::Idle
                }
            },
            None => {
                let auditor = &self.auditor;
                let local = self.config.local();
                self.builder.produce(
                    &mut self.ring,
                    &mut *io.input,
                    &mut *io.network,
                    consumed,
                    |unit| auditor.stamp(local, unit),
                )
            }
        };

        match production {
            Production::Produced(step) => {
                tracing::trace!(%step, "unit produced");
                Ok(true)
            }
            Production::Deferred => {
                self.metrics.deferred_productions += 1;
                tracing::debug!(
                    produced = self.builder.next_to_produce(),
                    consumed,
                    "production deferred by lookahead cap"
                );
                Ok(false)
            }
            Production::Idle => Ok(false),
        }
    }

    // ── Scheduling ──────────────────────────────────────────────

    fn try_run_units(&mut self, io: &mut FrameIo<'_>) -> Result<FrameReport, SessionError> {
        self.metrics.frames_driven += 1;

        let enter_units = self.now_units(&mut *io.clock, 0);
        let real_elapsed = enter_units - self.last_frame_units;
        self.last_frame_units = enter_units;

        if self.config.single_step {
            self.produce_one(io)?;
        } else {
            self.update_production(io)?;
        }

        let mut lowest = self.lowest();
        let available = lowest as i64 - self.consumed_units() as i64;
        let mut counts = choose_counts(self.config.policy, real_elapsed, available) as u64;
        if self.config.policy == Policy::LegacyAdaptive && self.config.networked {
            self.smooth(lowest);
        }

        while !self.players_in_game() || lowest < self.consumed_units() + counts {
            self.update_production(io)?;
            lowest = self.lowest();
            let consumed = self.consumed_units();
            if lowest < consumed {
                tracing::warn!(consumed, lowest, "production fell behind consumption");
                return Err(SessionError::ConsumptionAhead { consumed, lowest });
            }
            if self.players_in_game() && lowest >= consumed + counts {
                break;
            }
            if self.playback_ended() {
                if lowest > consumed && self.players_in_game() {
                    counts = lowest - consumed;
                    break;
                }
                return Ok(FrameReport::new(0, FrameOutcome::PlaybackEnded));
            }
            let waited = self.now_units(&mut *io.clock, 0) - enter_units;
            if waited >= self.config.stall_budget_steps as i64 {
                self.metrics.stalled_frames += 1;
                tracing::debug!(
                    consumed,
                    lowest,
                    counts,
                    "frame stalled waiting for production"
                );
                return Ok(FrameReport::new(0, FrameOutcome::Stalled));
            }
            io.clock.idle();
        }

        let mut executed = 0;
        for _ in 0..counts {
            if !self.players_in_game() {
                break;
            }
            let unit = self.consumed_units();
            for sub in 0..self.step_dup() {
                if unit > lowest {
                    tracing::warn!(consumed = unit, lowest, "consumption overran production");
                    return Err(SessionError::ConsumptionAhead {
                        consumed: unit,
                        lowest,
                    });
                }
                self.run_step(io, unit, sub == 0)?;
                executed += 1;
                if sub + 1 < self.step_dup() {
                    if squash(self.ring.batch_mut(unit)) {
                        self.metrics.squashed_substeps += 1;
                    }
                } else {
                    // The slot must be empty before the receive window
                    // moves past it.
                    self.ring.release(unit);
                }
                self.update_production(io)?;
            }
        }

        Ok(FrameReport::new(executed, FrameOutcome::Ran))
    }

    /// Legacy networked smoothing against the slowest participant.
    fn smooth(&mut self, lowest: u64) {
        let action = self.smoother.observe(
            self.config.local(),
            &self.last_in_game,
            self.builder.next_to_produce(),
            lowest,
        );
        if action.nudge {
            self.timer.nudge();
            self.metrics.slow_down_nudges += 1;
        }
        if action.skip {
            self.timer.skip(1);
            tracing::debug!(history = ?self.smoother.history(), "frame skip scheduled");
        }
    }

    /// Audit, record and execute one logical step of `unit`.
    fn run_step(
        &mut self,
        io: &mut FrameIo<'_>,
        unit: u64,
        first: bool,
    ) -> Result<(), SessionError> {
        let audit = first && self.auditing();
        if audit {
            self.metrics.audited_steps += 1;
            if let Err(report) = self.auditor.check(unit, self.ring.batch(unit)) {
                tracing::warn!(%report, "consistency failure");
                io.executor.on_desync(&report);
                return Err(report.into());
            }
        }

        if let Some(recorder) = self.recorder.as_mut() {
            // Record a copy: remote slots must execute exactly as their
            // producers sent them.
            let mut stored = *self.ring.batch(unit);
            recorder.record_tic(&mut stored)?;
        }

        let batch = self.ring.batch(unit);
        let world = io.executor.execute(batch);
        if audit {
            self.auditor.record(unit, batch, world);
        }
        self.last_in_game = batch.in_game;

        tracing::trace!(step = self.next_to_consume, unit, "step executed");
        self.next_to_consume += 1;
        self.metrics.steps_executed += 1;
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("policy", &self.config.policy)
            .field("step_dup", &self.config.step_dup)
            .field("local", &self.config.local_index)
            .field("next_to_produce", &self.builder.next_to_produce())
            .field("next_to_consume", &self.next_to_consume)
            .field("lowest_available", &self.lowest())
            .field("recording", &self.is_recording())
            .field("playing_back", &self.is_playing_back())
            .field("terminated", &self.terminated)
            .finish()
    }
}
