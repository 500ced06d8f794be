//! ticsync: fixed-rate lockstep step scheduling for deterministic
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the ticsync sub-crates. For most users, adding `ticsync` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use ticsync::prelude::*;
//!
//! // A wall clock that jumps one frame per idle call.
//! struct Clock(u64);
//! impl FrameClock for Clock {
//!     fn now_ms(&mut self) -> u64 { self.0 }
//!     fn idle(&mut self) { self.0 += 1; }
//! }
//!
//! // Input that always walks forward.
//! struct Walk;
//! impl InputSource for Walk {
//!     fn sample(&mut self, _step: StepId) -> CommandRecord {
//!         CommandRecord { forward_move: 25, ..Default::default() }
//!     }
//! }
//!
//! // A one-dimensional world.
//! #[derive(Default)]
//! struct Line { x: i32, steps: u8 }
//! impl FingerprintSource for Line {
//!     fn entity_x(&self, _p: ParticipantId) -> Option<i32> { Some(self.x) }
//!     fn rng_index(&self) -> u8 { self.steps }
//! }
//! impl StepExecutor for Line {
//!     fn execute(&mut self, batch: &CommandBatch) -> &dyn FingerprintSource {
//!         self.x += batch.commands[0].forward_move as i32;
//!         self.steps = self.steps.wrapping_add(1);
//!         self
//!     }
//! }
//!
//! let mut session = Session::begin(SessionConfig::default(), 0).unwrap();
//! let mut clock = Clock(0);
//! let mut world = Line::default();
//! for _ in 0..35 {
//!     clock.0 += 29;
//!     session
//!         .drive_one_frame(&mut FrameIo {
//!             clock: &mut clock,
//!             input: &mut Walk,
//!             network: &mut Offline,
//!             executor: &mut world,
//!         })
//!         .unwrap();
//! }
//! // 1015 ms at 35 Hz.
//! assert_eq!(session.next_to_consume(), 35);
//! assert_eq!(world.x, 35 * 25);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ticsync-core` | Commands, IDs, errors, collaborator traits |
//! | [`demo`] | `ticsync-demo` | Demo recording, playback and byte codec |
//! | [`engine`] | `ticsync-engine` | Session driver, ring, auditor, scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Commands, IDs, errors and collaborator traits (`ticsync-core`).
///
/// The traits ([`types::FrameClock`], [`types::InputSource`],
/// [`types::NetworkLink`], [`types::StepExecutor`]) are what an
/// application implements to host a session.
pub use ticsync_core as types;

/// Demo recording and playback (`ticsync-demo`).
///
/// Sessions record and play demos directly; use [`demo::DemoPlayer`] and
/// [`demo::DemoRecorder`] to inspect or produce streams offline.
pub use ticsync_demo as demo;

/// The session driver and its building blocks (`ticsync-engine`).
pub use ticsync_engine as engine;

/// Common imports for hosting a session.
///
/// ```rust
/// use ticsync::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use ticsync_core::{
        Buttons, CommandBatch, CommandRecord, FingerprintSource, FrameClock, InputSource,
        NetworkLink, Offline, ParticipantId, StepExecutor, StepId, MAX_PARTICIPANTS, TICRATE,
    };

    // Errors
    pub use ticsync_core::{DesyncReport, SessionError};
    pub use ticsync_demo::DemoError;
    pub use ticsync_engine::ConfigError;

    // Engine
    pub use ticsync_engine::{
        FrameIo, FrameOutcome, FrameReport, Policy, Session, SessionConfig, SessionMetrics,
    };
}
