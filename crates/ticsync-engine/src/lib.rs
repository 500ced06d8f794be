//! Fixed-rate tic scheduling for replicated simulations.
//!
//! Provides the [`Session`] frame driver that decides, once per real
//! frame, how many buffered logical steps may run so that every
//! participant stays within a bounded lookahead window, and that feeds
//! those steps to an opaque [`StepExecutor`](ticsync_core::StepExecutor).
//!
//! # Architecture
//!
//! - [`clock`]: wall-clock milliseconds to logical steps
//! - [`ring`]: the fixed-capacity step ring
//! - [`builder`]: local production under the lookahead cap
//! - [`inbox`]: remote receive cursors and the network write path
//! - [`scheduler`]: count selection and the legacy frame-skip smoother
//! - [`audit`]: cross-replica fingerprint checking
//! - [`squash`]: one-shot field clearing for duplicated sub-steps
//! - [`session`]: the frame driver tying them together

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod builder;
pub mod clock;
pub mod config;
pub mod inbox;
pub mod metrics;
pub mod ring;
pub mod scheduler;
pub mod session;
pub mod squash;

pub use audit::ConsistencyAuditor;
pub use builder::{CommandBuilder, Production};
pub use clock::{ms_to_steps, ClockAdapter};
pub use config::{
    ConfigError, SessionConfig, BACKUPTICS, DEFAULT_STALL_BUDGET, MAX_STEP_DUP, MIN_RING_CAPACITY,
};
pub use inbox::{ParticipantCursors, RemoteInbox};
pub use metrics::SessionMetrics;
pub use ring::StepRing;
pub use scheduler::{choose_counts, LegacySmoother, Policy, ProductionTimer};
pub use session::{FrameIo, FrameOutcome, FrameReport, Session};
pub use squash::squash;
