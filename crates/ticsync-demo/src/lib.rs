//! Demo recording and playback for ticsync sessions.
//!
//! A demo is the finalized per-step command stream of a session, stored in
//! the historical byte-compatible layout so that existing recordings play
//! back and new recordings load in existing players.
//!
//! # Architecture
//!
//! - [`DemoRecorder`] encodes finalized batches into an in-memory buffer
//! - [`DemoPlayer`] decodes a buffer back into one batch per tic
//! - [`codec`] holds the byte-level encode/decode functions
//!
//! # Format
//!
//! ```text
//! [version] [skill] [episode] [map] [deathmatch] [respawn] [fast]
//! [nomonsters] [console player] [in_game x4]
//! [tic 1: one record per occupied slot] ... [tic N] [0x80]
//! ```
//!
//! A standard record is 4 bytes (forward, side, turn high byte, buttons).
//! Version 111 selects expanded records, which store the full 16-bit turn
//! delta low byte first.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use codec::quantize_turn;
pub use error::DemoError;
pub use reader::{DemoPlayer, TicIter};
pub use types::{
    is_supported_version, DemoHeader, GameParams, TurnResolution, DEFAULT_GROWTH_BYTES,
    DEMO_MARKER, HEADER_SIZE, LONGTICS_VERSION, OLDEST_VANILLA_VERSION, VANILLA_VERSION,
};
pub use writer::DemoRecorder;
