//! Binary encode/decode for the demo format.
//!
//! The layout is fixed by the historical format: single bytes only, no
//! length prefixes, no alignment padding. Multi-byte turn deltas (expanded
//! resolution) are little-endian. Decoding works on an in-memory buffer
//! with an explicit offset so the end-of-stream sentinel can be detected
//! without consuming it.

use ticsync_core::{Buttons, CommandRecord, MAX_PARTICIPANTS};

use crate::error::DemoError;
use crate::types::*;

/// Result of decoding at a record boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A full record was read and the offset advanced past it.
    Record(CommandRecord),
    /// The sentinel (or a clean end of buffer) was reached. The offset
    /// is left where it was.
    EndOfStream,
}

// ── Turn quantization ───────────────────────────────────────────

/// The single byte stored for `turn` in standard resolution: the high
/// byte of the 16-bit value. The low byte is discarded, not rounded.
pub fn turn_high_byte(turn: i16) -> u8 {
    (turn >> 8) as u8
}

/// Expand a stored high byte back into a 16-bit turn delta.
pub fn turn_from_high_byte(byte: u8) -> i16 {
    ((byte as u16) << 8) as i16
}

/// The value `turn` decodes to after a standard-resolution round trip:
/// the next 256-aligned value at or below it.
pub fn quantize_turn(turn: i16) -> i16 {
    turn_from_high_byte(turn_high_byte(turn))
}

// ── Header encode/decode ────────────────────────────────────────

/// Append the demo header.
pub fn encode_header(buf: &mut Vec<u8>, header: &DemoHeader) {
    let p = &header.params;
    buf.extend_from_slice(&[
        header.version,
        p.skill,
        p.episode,
        p.map,
        p.deathmatch,
        p.respawn as u8,
        p.fast as u8,
        p.no_monsters as u8,
        header.console_player,
    ]);
    buf.extend(header.in_game.iter().map(|&b| b as u8));
}

/// Decode and validate the demo header at the start of `data`.
///
/// Returns the header and the offset of the first record.
pub fn decode_header(data: &[u8]) -> Result<(DemoHeader, usize), DemoError> {
    if data.len() < HEADER_SIZE {
        return Err(DemoError::Truncated {
            offset: 0,
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }

    let version = data[0];
    if !is_supported_version(version) {
        return Err(DemoError::UnsupportedVersion { found: version });
    }

    let params = GameParams {
        skill: data[1],
        episode: data[2],
        map: data[3],
        deathmatch: data[4],
        respawn: read_flag(data, 5)?,
        fast: read_flag(data, 6)?,
        no_monsters: read_flag(data, 7)?,
    };

    let console_player = data[8];
    if console_player as usize >= MAX_PARTICIPANTS {
        return Err(DemoError::InvalidHeader {
            detail: format!("console player {console_player} out of range"),
        });
    }

    let mut in_game = [false; MAX_PARTICIPANTS];
    for (slot, flag) in in_game.iter_mut().enumerate() {
        *flag = read_flag(data, 9 + slot)?;
    }
    if !in_game.iter().any(|&b| b) {
        return Err(DemoError::InvalidHeader {
            detail: "no participant slot is occupied".into(),
        });
    }

    Ok((
        DemoHeader {
            version,
            params,
            console_player,
            in_game,
        },
        HEADER_SIZE,
    ))
}

fn read_flag(data: &[u8], offset: usize) -> Result<bool, DemoError> {
    match data[offset] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DemoError::InvalidHeader {
            detail: format!("flag byte {offset} must be 0 or 1, got {other}"),
        }),
    }
}

// ── Record encode/decode ────────────────────────────────────────

/// Append one record in the given resolution.
///
/// Only forward, side, turn and buttons are stored; the remaining fields
/// decode as zero. A forward move equal to the sentinel byte is written
/// as the next value toward zero, so a live recording can never end
/// itself early.
pub fn encode_record(buf: &mut Vec<u8>, cmd: &CommandRecord, resolution: TurnResolution) {
    let forward = if cmd.forward_move as u8 == DEMO_MARKER {
        cmd.forward_move + 1
    } else {
        cmd.forward_move
    };
    buf.push(forward as u8);
    buf.push(cmd.side_move as u8);
    match resolution {
        TurnResolution::Standard => buf.push(turn_high_byte(cmd.angle_turn)),
        TurnResolution::Expanded => buf.extend_from_slice(&cmd.angle_turn.to_le_bytes()),
    }
    buf.push(cmd.buttons.0);
}

/// Decode the record at `*offset`.
///
/// On [`Decoded::Record`] the offset advances by the record size. At the
/// sentinel or at the exact end of `data` the offset is left untouched.
/// A partial record is an error.
pub fn decode_record(
    data: &[u8],
    offset: &mut usize,
    resolution: TurnResolution,
) -> Result<Decoded, DemoError> {
    let start = *offset;
    let remaining = data.len().saturating_sub(start);
    if remaining == 0 || data[start] == DEMO_MARKER {
        return Ok(Decoded::EndOfStream);
    }

    let size = resolution.record_size();
    if remaining < size {
        return Err(DemoError::Truncated {
            offset: start,
            needed: size,
            available: remaining,
        });
    }

    let bytes = &data[start..start + size];
    let (angle_turn, buttons) = match resolution {
        TurnResolution::Standard => (turn_from_high_byte(bytes[2]), bytes[3]),
        TurnResolution::Expanded => (i16::from_le_bytes([bytes[2], bytes[3]]), bytes[4]),
    };
    *offset = start + size;

    Ok(Decoded::Record(CommandRecord {
        forward_move: bytes[0] as i8,
        side_move: bytes[1] as i8,
        angle_turn,
        buttons: Buttons(buttons),
        ..CommandRecord::default()
    }))
}

/// The fields of `cmd` that survive a round trip in `resolution`.
///
/// Used by the recorder's self-check and by tests.
pub fn stored_view(cmd: &CommandRecord, resolution: TurnResolution) -> CommandRecord {
    let mut buf = Vec::with_capacity(resolution.record_size());
    encode_record(&mut buf, cmd, resolution);
    let mut offset = 0;
    match decode_record(&buf, &mut offset, resolution) {
        Ok(Decoded::Record(r)) => r,
        // encode_record never emits the sentinel as the first byte.
        _ => CommandRecord::default(),
    }
}
