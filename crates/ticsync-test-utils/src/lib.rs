//! Test utilities and mock collaborators for ticsync development.
//!
//! Provides controllable implementations of the scheduler's collaborator
//! traits ([`FrameClock`], [`InputSource`], [`NetworkLink`]) plus the
//! executor and demo fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{single_player_demo, MockWorld};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ticsync_core::{
    CommandInbox, CommandRecord, FrameClock, InputSource, NetworkLink, ParticipantId,
    SessionError, StepId,
};

// ── Clock ───────────────────────────────────────────────────────

/// A clock that only moves when told to.
///
/// [`idle`](FrameClock::idle) advances by `idle_step_ms` (1 ms by
/// default), so a scheduler waiting for production always makes progress
/// toward its stall budget.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now_ms: u64,
    idle_step_ms: u64,
    idles: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(0)
    }

    pub fn at(now_ms: u64) -> Self {
        Self {
            now_ms,
            idle_step_ms: 1,
            idles: 0,
        }
    }

    /// Change how far each idle call advances the clock.
    pub fn with_idle_step(mut self, ms: u64) -> Self {
        self.idle_step_ms = ms;
        self
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    pub fn set(&mut self, ms: u64) {
        self.now_ms = ms;
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Number of idle calls so far.
    pub fn idles(&self) -> u64 {
        self.idles
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&mut self) -> u64 {
        self.now_ms
    }

    fn idle(&mut self) {
        self.idles += 1;
        self.now_ms += self.idle_step_ms;
    }
}

// ── Input ───────────────────────────────────────────────────────

/// Replays a fixed list of commands, one per sample, then defaults.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    script: Vec<CommandRecord>,
    cursor: usize,
    services: u64,
    sampled: Vec<StepId>,
}

impl ScriptedInput {
    pub fn new(script: Vec<CommandRecord>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// A script that walks forward by `forward_move` every sample.
    pub fn walking(forward_move: i8, len: usize) -> Self {
        let cmd = CommandRecord {
            forward_move,
            ..CommandRecord::default()
        };
        Self::new(vec![cmd; len])
    }

    /// A reproducible pseudo-random script.
    ///
    /// Forward moves avoid -128 so every command survives recording
    /// unchanged apart from turn quantization.
    pub fn random(seed: u64, len: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let script = (0..len)
            .map(|_| {
                let bits = rng.next_u64();
                CommandRecord {
                    forward_move: ((bits & 0xff) as u8 as i8).max(-127),
                    side_move: (bits >> 8) as u8 as i8,
                    angle_turn: (bits >> 16) as u16 as i16,
                    buttons: ticsync_core::Buttons((bits >> 32) as u8 & 0x07),
                    ..CommandRecord::default()
                }
            })
            .collect();
        Self::new(script)
    }

    /// How many times the scheduler polled devices.
    pub fn services(&self) -> u64 {
        self.services
    }

    /// Produced units sampled so far, in order.
    pub fn sampled(&self) -> &[StepId] {
        &self.sampled
    }

    /// The scripted command at index `i`.
    pub fn script(&self) -> &[CommandRecord] {
        &self.script
    }
}

impl InputSource for ScriptedInput {
    fn service(&mut self) {
        self.services += 1;
    }

    fn sample(&mut self, step: StepId) -> CommandRecord {
        self.sampled.push(step);
        let cmd = self.script.get(self.cursor).copied().unwrap_or_default();
        self.cursor += 1;
        cmd
    }
}

// ── Network ─────────────────────────────────────────────────────

/// One queued remote command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub participant: ParticipantId,
    pub step: StepId,
    pub command: CommandRecord,
}

type Queue = Rc<RefCell<VecDeque<Delivery>>>;

/// In-process transport for single-threaded tests.
///
/// Each link owns an incoming queue drained on [`poll`](NetworkLink::poll)
/// and may forward its own sends into a peer's queue, tagged as coming
/// from `sender`.
#[derive(Debug)]
pub struct MockNetwork {
    incoming: Queue,
    outgoing: Option<Queue>,
    sender: ParticipantId,
    held: bool,
    offset_ms: i32,
    sent: Vec<(StepId, CommandRecord)>,
    pending_removals: Vec<ParticipantId>,
    polls: u64,
}

impl MockNetwork {
    /// A link with nobody on the other end. Deliveries are queued by hand
    /// with [`push`](Self::push).
    pub fn detached() -> Self {
        Self {
            incoming: Rc::default(),
            outgoing: None,
            sender: ParticipantId(0),
            held: false,
            offset_ms: 0,
            sent: Vec::new(),
            pending_removals: Vec::new(),
            polls: 0,
        }
    }

    /// A link whose sends come straight back as `remote`'s commands.
    pub fn loopback(remote: ParticipantId) -> Self {
        let mut net = Self::detached();
        net.outgoing = Some(Rc::clone(&net.incoming));
        net.sender = remote;
        net
    }

    /// Two connected links for participants `a` and `b`.
    pub fn pair(a: ParticipantId, b: ParticipantId) -> (Self, Self) {
        let mut left = Self::detached();
        let mut right = Self::detached();
        left.sender = a;
        left.outgoing = Some(Rc::clone(&right.incoming));
        right.sender = b;
        right.outgoing = Some(Rc::clone(&left.incoming));
        (left, right)
    }

    /// Queue a delivery for the next poll.
    pub fn push(&mut self, participant: ParticipantId, step: StepId, command: CommandRecord) {
        self.incoming.borrow_mut().push_back(Delivery {
            participant,
            step,
            command,
        });
    }

    /// While held, polls deliver nothing (simulated packet loss).
    pub fn hold(&mut self, held: bool) {
        self.held = held;
    }

    /// Report `participant` as departed on the next poll.
    pub fn depart(&mut self, participant: ParticipantId) {
        self.pending_removals.push(participant);
    }

    pub fn set_clock_offset(&mut self, ms: i32) {
        self.offset_ms = ms;
    }

    /// Local commands transmitted so far.
    pub fn sent(&self) -> &[(StepId, CommandRecord)] {
        &self.sent
    }

    /// Deliveries waiting in the incoming queue.
    pub fn queued(&self) -> usize {
        self.incoming.borrow().len()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl NetworkLink for MockNetwork {
    fn poll(&mut self, inbox: &mut dyn CommandInbox) -> Result<(), SessionError> {
        self.polls += 1;
        if self.held {
            return Ok(());
        }
        loop {
            let next = self.incoming.borrow_mut().pop_front();
            let Some(d) = next else { break };
            inbox.deliver(d.participant, d.step, d.command)?;
        }
        for p in self.pending_removals.drain(..) {
            inbox.remove_participant(p);
        }
        Ok(())
    }

    fn send(&mut self, step: StepId, command: &CommandRecord) {
        self.sent.push((step, *command));
        if let Some(out) = &self.outgoing {
            out.borrow_mut().push_back(Delivery {
                participant: self.sender,
                step,
                command: *command,
            });
        }
    }

    fn clock_offset_ms(&self) -> i32 {
        self.offset_ms
    }
}
