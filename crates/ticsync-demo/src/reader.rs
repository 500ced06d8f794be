//! Demo playback.
//!
//! [`DemoPlayer`] holds a whole demo in memory and yields one batch per
//! recorded tic until the end marker. The header is validated on
//! construction.

use std::io::Read;

use ticsync_core::{CommandBatch, MAX_PARTICIPANTS};

use crate::codec::{decode_header, decode_record, Decoded};
use crate::error::DemoError;
use crate::types::DemoHeader;

/// Reads recorded tics from a demo stream.
pub struct DemoPlayer {
    data: Vec<u8>,
    header: DemoHeader,
    offset: usize,
    tics_read: u64,
    finished: bool,
}

impl DemoPlayer {
    /// Open an in-memory demo, reading and validating the header.
    pub fn new(data: Vec<u8>) -> Result<Self, DemoError> {
        let (header, offset) = decode_header(&data)?;
        tracing::debug!(
            version = header.version,
            participants = header.participant_count(),
            console_player = header.console_player,
            "demo playback opened"
        );
        Ok(Self {
            data,
            header,
            offset,
            tics_read: 0,
            finished: false,
        })
    }

    /// Load a demo from any `Read` source.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DemoError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::new(data)
    }

    /// The decoded header.
    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    /// Read the next tic, or `None` once the end marker (or a clean end
    /// of data) has been reached.
    ///
    /// The returned batch has every slot the header marks occupied set in
    /// game. After `None` every later call also returns `None`; after an
    /// error the player is finished as well.
    pub fn next_tic(&mut self) -> Result<Option<CommandBatch>, DemoError> {
        if self.finished {
            return Ok(None);
        }

        let resolution = self.header.resolution();
        let tic_start = self.offset;
        let mut offset = self.offset;
        let mut batch = CommandBatch::default();

        for slot in 0..MAX_PARTICIPANTS {
            if !self.header.in_game[slot] {
                continue;
            }
            match decode_record(&self.data, &mut offset, resolution) {
                Ok(Decoded::Record(cmd)) => {
                    batch.commands[slot] = cmd;
                    batch.in_game[slot] = true;
                }
                Ok(Decoded::EndOfStream) if offset == tic_start => {
                    tracing::debug!(tics = self.tics_read, "demo playback reached end");
                    self.finished = true;
                    return Ok(None);
                }
                Ok(Decoded::EndOfStream) => {
                    // The marker only ends a stream between tics.
                    self.finished = true;
                    return Err(DemoError::Truncated {
                        offset,
                        needed: resolution.record_size(),
                        available: self.data.len().saturating_sub(offset),
                    });
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }

        self.offset = offset;
        self.tics_read += 1;
        Ok(Some(batch))
    }

    /// Whether the end of the stream has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of tics read so far.
    pub fn tics_read(&self) -> u64 {
        self.tics_read
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Convert into a tic iterator.
    pub fn tics(self) -> TicIter {
        TicIter { player: self }
    }
}

impl std::fmt::Debug for DemoPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoPlayer")
            .field("header", &self.header)
            .field("len", &self.data.len())
            .field("offset", &self.offset)
            .field("tics_read", &self.tics_read)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Iterator adapter over recorded tics.
#[derive(Debug)]
pub struct TicIter {
    player: DemoPlayer,
}

impl Iterator for TicIter {
    type Item = Result<CommandBatch, DemoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.player.next_tic().transpose()
    }
}
