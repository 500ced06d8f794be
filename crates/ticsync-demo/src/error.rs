//! Error types for the demo codec.

use std::fmt;
use std::io;

use ticsync_core::SessionError;

/// Errors that can occur during demo recording or playback.
#[derive(Debug)]
pub enum DemoError {
    /// An I/O error occurred while loading or storing a demo.
    Io(io::Error),
    /// The version byte is not one this codec can play back.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// The header is structurally invalid.
    InvalidHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The stream ended in the middle of a header or record.
    Truncated {
        /// Byte offset at which the read started.
        offset: usize,
        /// Bytes the read needed.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// A just-written record did not decode back to itself.
    SelfCheckMismatch {
        /// Byte offset of the offending record.
        offset: usize,
        /// Human-readable description of the differing field.
        detail: String,
    },
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported demo version {found}")
            }
            Self::InvalidHeader { detail } => write!(f, "invalid demo header: {detail}"),
            Self::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated demo at byte {offset}: needed {needed} bytes, {available} available"
            ),
            Self::SelfCheckMismatch { offset, detail } => {
                write!(f, "record at byte {offset} failed self-check: {detail}")
            }
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DemoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DemoError> for SessionError {
    fn from(e: DemoError) -> Self {
        let offset = match &e {
            DemoError::Truncated { offset, .. } | DemoError::SelfCheckMismatch { offset, .. } => {
                *offset
            }
            _ => 0,
        };
        SessionError::StreamCorrupt {
            offset,
            detail: e.to_string(),
        }
    }
}
