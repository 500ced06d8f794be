//! Core types and traits for the ticsync step scheduler.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! per-participant command record, the per-step command batch, the
//! strongly-typed identifiers, the session error taxonomy, and the traits
//! through which the scheduler talks to its collaborators (input devices,
//! network transport, wall clock, and the opaque step executor).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod traits;

pub use command::{Buttons, CommandBatch, CommandRecord, MAX_PARTICIPANTS};
pub use error::{DesyncReport, SessionError};
pub use id::{ParticipantId, StepId};
pub use traits::{
    CommandInbox, FingerprintSource, FrameClock, InputSource, NetworkLink, Offline, StepExecutor,
};

/// Fixed logical step rate, in steps per second.
pub const TICRATE: u32 = 35;
