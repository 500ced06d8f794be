//! Demo recording.
//!
//! [`DemoRecorder`] accumulates records in memory, growing its buffer in
//! fixed increments, and emits the finished stream (with its sentinel)
//! when recording ends.

use std::io::Write;

use ticsync_core::{CommandBatch, CommandRecord, ParticipantId, MAX_PARTICIPANTS};

use crate::codec::{decode_record, encode_header, encode_record, Decoded};
use crate::error::DemoError;
use crate::types::{DemoHeader, TurnResolution, DEFAULT_GROWTH_BYTES, DEMO_MARKER};

/// Records finalized step batches into a demo stream.
///
/// Every occupied slot (per the header) is stored once per recorded tic.
/// Recording is destructive on purpose: after [`record_tic`] the batch
/// holds exactly what playback will reproduce, so the recording replica
/// simulates the same quantized input a later playback will.
///
/// [`record_tic`]: DemoRecorder::record_tic
///
/// # Examples
///
/// ```
/// use ticsync_core::{CommandBatch, CommandRecord};
/// use ticsync_demo::{DemoHeader, DemoPlayer, DemoRecorder, GameParams, TurnResolution};
///
/// let header = DemoHeader::for_recording(
///     TurnResolution::Standard,
///     GameParams::default(),
///     0,
///     [true, false, false, false],
/// );
/// let mut recorder = DemoRecorder::new(header);
///
/// let mut batch = CommandBatch::default();
/// batch.in_game[0] = true;
/// batch.commands[0] = CommandRecord { forward_move: 25, angle_turn: 300, ..Default::default() };
/// recorder.record_tic(&mut batch).unwrap();
/// assert_eq!(batch.commands[0].angle_turn, 256);
///
/// let bytes = recorder.finish();
/// let mut player = DemoPlayer::new(bytes).unwrap();
/// let replayed = player.next_tic().unwrap().unwrap();
/// assert_eq!(replayed.commands[0], batch.commands[0]);
/// assert!(player.next_tic().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct DemoRecorder {
    header: DemoHeader,
    buf: Vec<u8>,
    growth: usize,
    tics_recorded: u64,
}

impl DemoRecorder {
    /// Start a recording with the default growth increment.
    pub fn new(header: DemoHeader) -> Self {
        Self::with_growth(header, DEFAULT_GROWTH_BYTES)
    }

    /// Start a recording whose buffer grows by `growth` bytes at a time.
    ///
    /// A zero increment is treated as one record.
    pub fn with_growth(header: DemoHeader, growth: usize) -> Self {
        let growth = growth.max(header.resolution().record_size());
        let mut buf = Vec::with_capacity(growth);
        encode_header(&mut buf, &header);
        tracing::debug!(
            version = header.version,
            participants = header.participant_count(),
            "demo recording started"
        );
        Self {
            header,
            buf,
            growth,
            tics_recorded: 0,
        }
    }

    /// The header written at the start of the stream.
    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    /// Turn resolution of this recording.
    pub fn resolution(&self) -> TurnResolution {
        self.header.resolution()
    }

    /// Encode one tic and replace each stored command with its decoded
    /// form.
    pub fn record_tic(&mut self, batch: &mut CommandBatch) -> Result<(), DemoError> {
        let resolution = self.resolution();
        let size = resolution.record_size();

        for slot in 0..MAX_PARTICIPANTS {
            if !self.header.in_game[slot] {
                continue;
            }
            if self.buf.capacity() - self.buf.len() < size {
                self.buf.reserve_exact(self.growth);
            }

            let cmd = &mut batch.commands[slot];
            if cmd.forward_move == i8::MIN {
                tracing::debug!(
                    participant = %ParticipantId(slot as u8),
                    "forward move collides with the end marker, clamped"
                );
            }

            let offset = self.buf.len();
            encode_record(&mut self.buf, cmd, resolution);
            let mut cursor = offset;
            match decode_record(&self.buf, &mut cursor, resolution)? {
                Decoded::Record(stored) => {
                    *cmd = CommandRecord {
                        chat_char: cmd.chat_char,
                        consistency: cmd.consistency,
                        buttons2: cmd.buttons2,
                        inventory: cmd.inventory,
                        look: cmd.look,
                        ..stored
                    };
                }
                Decoded::EndOfStream => {
                    return Err(DemoError::SelfCheckMismatch {
                        offset,
                        detail: "record decoded as end of stream".into(),
                    });
                }
            }
        }

        self.tics_recorded += 1;
        Ok(())
    }

    /// Number of tics recorded so far.
    pub fn tics_recorded(&self) -> u64 {
        self.tics_recorded
    }

    /// Bytes buffered so far, header included, sentinel excluded.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no tic has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.tics_recorded == 0
    }

    /// Current buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Append the end marker and return the complete stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(DEMO_MARKER);
        tracing::debug!(
            tics = self.tics_recorded,
            bytes = self.buf.len(),
            "demo recording finished"
        );
        self.buf
    }

    /// Append the end marker and write the complete stream to `sink`.
    pub fn finish_into<W: Write>(self, mut sink: W) -> Result<(), DemoError> {
        let bytes = self.finish();
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }
}
