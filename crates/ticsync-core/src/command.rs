//! Command record, button layout, and the per-step command batch.

use smallvec::SmallVec;

use crate::id::ParticipantId;

/// Maximum number of participants in a session.
///
/// Matches the number of occupancy bytes in the historical demo header, so
/// one [`CommandBatch`] maps onto exactly one recorded tic.
pub const MAX_PARTICIPANTS: usize = 4;

// ── Buttons ─────────────────────────────────────────────────────

/// The action-button byte of a [`CommandRecord`].
///
/// When [`SPECIAL`](Buttons::SPECIAL) is clear the byte carries
/// attack/use/weapon-change bits. When it is set the low bits are
/// reinterpreted as meta actions (pause, save-game request) that must
/// fire exactly once per produced unit.
///
/// # Examples
///
/// ```
/// use ticsync_core::Buttons;
///
/// let b = Buttons::weapon_change(3).with(Buttons::ATTACK);
/// assert!(b.contains(Buttons::ATTACK));
/// assert_eq!(b.weapon(), Some(3));
/// assert!(!b.is_special());
///
/// let pause = Buttons::special(Buttons::PAUSE);
/// assert!(pause.is_special());
/// assert_eq!(pause.weapon(), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Buttons(pub u8);

impl Buttons {
    /// Fire the current weapon.
    pub const ATTACK: u8 = 0x01;
    /// Use a line (open a door, flip a switch).
    pub const USE: u8 = 0x02;
    /// A weapon change is pending; the index lives in [`WEAPON_MASK`](Self::WEAPON_MASK).
    pub const CHANGE: u8 = 0x04;
    /// Bits holding the requested weapon index.
    pub const WEAPON_MASK: u8 = 0x38;
    /// Shift of the weapon index inside the button byte.
    pub const WEAPON_SHIFT: u8 = 3;
    /// The byte carries a meta action instead of gameplay buttons.
    pub const SPECIAL: u8 = 0x80;
    /// Mask of the meta action kind when [`SPECIAL`](Self::SPECIAL) is set.
    pub const SPECIAL_MASK: u8 = 0x03;
    /// Meta action: toggle pause.
    pub const PAUSE: u8 = 0x01;
    /// Meta action: save the game into the slot in [`SAVE_MASK`](Self::SAVE_MASK).
    pub const SAVE_GAME: u8 = 0x02;
    /// Bits holding the save slot index.
    pub const SAVE_MASK: u8 = 0x1c;
    /// Shift of the save slot inside the button byte.
    pub const SAVE_SHIFT: u8 = 2;

    /// A button byte requesting a change to `weapon` (0..=7).
    pub fn weapon_change(weapon: u8) -> Self {
        Self(Self::CHANGE | ((weapon << Self::WEAPON_SHIFT) & Self::WEAPON_MASK))
    }

    /// A special (meta action) button byte.
    pub fn special(kind: u8) -> Self {
        Self(Self::SPECIAL | (kind & Self::SPECIAL_MASK))
    }

    /// A save-game request for `slot` (0..=7).
    pub fn save_game(slot: u8) -> Self {
        Self(
            Self::SPECIAL
                | Self::SAVE_GAME
                | ((slot << Self::SAVE_SHIFT) & Self::SAVE_MASK),
        )
    }

    /// Return a copy with `bits` set.
    pub fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    /// Whether every bit in `bits` is set.
    pub fn contains(self, bits: u8) -> bool {
        self.0 & bits == bits
    }

    /// Whether the special (meta action) bit is set.
    pub fn is_special(self) -> bool {
        self.0 & Self::SPECIAL != 0
    }

    /// The requested weapon index, if this is a gameplay byte with a
    /// pending weapon change.
    pub fn weapon(self) -> Option<u8> {
        if self.is_special() || !self.contains(Self::CHANGE) {
            return None;
        }
        Some((self.0 & Self::WEAPON_MASK) >> Self::WEAPON_SHIFT)
    }
}

// ── CommandRecord ───────────────────────────────────────────────

/// One participant's control vector for one logical step.
///
/// Immutable once finalized for a step: the builder writes it into the
/// ring, the codec may replace it with its decoded self, and from then on
/// every replica executes exactly these bytes.
///
/// # Examples
///
/// ```
/// use ticsync_core::{Buttons, CommandRecord};
///
/// let cmd = CommandRecord {
///     forward_move: 50,
///     angle_turn: 256,
///     buttons: Buttons(Buttons::ATTACK),
///     ..CommandRecord::default()
/// };
/// assert_eq!(cmd.side_move, 0);
/// assert!(cmd.buttons.contains(Buttons::ATTACK));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommandRecord {
    /// Forward/backward magnitude (positive = forward).
    pub forward_move: i8,
    /// Strafe magnitude (positive = right).
    pub side_move: i8,
    /// Turn delta in 16-bit angle units (positive = left).
    pub angle_turn: i16,
    /// One chat character, `0` when no character is being typed.
    pub chat_char: u8,
    /// Action buttons.
    pub buttons: Buttons,
    /// Fingerprint stamped by the producer for desync detection.
    pub consistency: u8,
    /// Secondary button byte for extended modes.
    pub buttons2: u8,
    /// Inventory selection for extended modes.
    pub inventory: u8,
    /// Look/fly control for extended modes.
    pub look: u8,
}

// ── CommandBatch ────────────────────────────────────────────────

/// One command slot per possible participant, plus occupancy flags.
///
/// Batches are allocated once as part of the step ring and overwritten
/// in place every `capacity` produced units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandBatch {
    /// Per-participant commands, indexed by participant slot.
    pub commands: [CommandRecord; MAX_PARTICIPANTS],
    /// Which slots hold an active participant for this step.
    pub in_game: [bool; MAX_PARTICIPANTS],
}

impl CommandBatch {
    /// The command for `participant`.
    pub fn command(&self, participant: ParticipantId) -> &CommandRecord {
        &self.commands[participant.index()]
    }

    /// Whether `participant` occupies its slot in this batch.
    pub fn is_in_game(&self, participant: ParticipantId) -> bool {
        self.in_game[participant.index()]
    }

    /// Occupied slots in ascending order.
    pub fn active_participants(&self) -> SmallVec<[ParticipantId; MAX_PARTICIPANTS]> {
        self.in_game
            .iter()
            .enumerate()
            .filter(|(_, &occupied)| occupied)
            .map(|(i, _)| ParticipantId(i as u8))
            .collect()
    }

    /// Whether any slot is occupied.
    pub fn any_in_game(&self) -> bool {
        self.in_game.iter().any(|&b| b)
    }

    /// Clear every slot's command and occupancy.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
