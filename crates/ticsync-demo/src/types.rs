//! Data types for demo recording and playback.

use ticsync_core::MAX_PARTICIPANTS;

/// Session-start parameters stored in the demo header.
///
/// The scheduler treats these as opaque bytes; they exist so a playback
/// can reconstruct the same game before the first step runs.
///
/// # Examples
///
/// ```
/// use ticsync_demo::GameParams;
///
/// let params = GameParams { skill: 2, episode: 1, map: 1, ..GameParams::default() };
/// assert_eq!(params.deathmatch, 0);
/// assert!(!params.no_monsters);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameParams {
    /// Difficulty index.
    pub skill: u8,
    /// Episode number.
    pub episode: u8,
    /// Map number within the episode.
    pub map: u8,
    /// Deathmatch mode (0 = cooperative).
    pub deathmatch: u8,
    /// Monsters respawn.
    pub respawn: bool,
    /// Fast monsters.
    pub fast: bool,
    /// No monsters.
    pub no_monsters: bool,
}

/// How the turn delta is stored per record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnResolution {
    /// One byte: the rounded high byte of the 16-bit turn delta.
    #[default]
    Standard,
    /// Two bytes, low byte first: the full 16-bit turn delta.
    Expanded,
}

impl TurnResolution {
    /// Encoded size of one record in this resolution.
    pub fn record_size(self) -> usize {
        match self {
            Self::Standard => 4,
            Self::Expanded => 5,
        }
    }
}

/// The fixed-layout header at the start of every demo.
///
/// # Examples
///
/// ```
/// use ticsync_demo::{DemoHeader, GameParams, TurnResolution, VANILLA_VERSION};
///
/// let header = DemoHeader {
///     version: VANILLA_VERSION,
///     params: GameParams { skill: 2, episode: 1, map: 1, ..GameParams::default() },
///     console_player: 0,
///     in_game: [true, false, false, false],
/// };
/// assert_eq!(header.resolution(), TurnResolution::Standard);
/// assert_eq!(header.participant_count(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoHeader {
    /// Version byte; selects the turn resolution.
    pub version: u8,
    /// Game parameters.
    pub params: GameParams,
    /// Slot of the participant whose view the demo was recorded from.
    pub console_player: u8,
    /// Occupied participant slots. Each tic stores one record per
    /// occupied slot, in slot order.
    pub in_game: [bool; MAX_PARTICIPANTS],
}

impl DemoHeader {
    /// Build the header for a new recording.
    pub fn for_recording(
        resolution: TurnResolution,
        params: GameParams,
        console_player: u8,
        in_game: [bool; MAX_PARTICIPANTS],
    ) -> Self {
        let version = match resolution {
            TurnResolution::Standard => VANILLA_VERSION,
            TurnResolution::Expanded => LONGTICS_VERSION,
        };
        Self {
            version,
            params,
            console_player,
            in_game,
        }
    }

    /// The turn resolution implied by the version byte.
    pub fn resolution(&self) -> TurnResolution {
        if self.version == LONGTICS_VERSION {
            TurnResolution::Expanded
        } else {
            TurnResolution::Standard
        }
    }

    /// Number of occupied slots, i.e. records per tic.
    pub fn participant_count(&self) -> usize {
        self.in_game.iter().filter(|&&b| b).count()
    }
}

// ── Format constants ────────────────────────────────────────────

/// Version byte written by standard-resolution recordings.
pub const VANILLA_VERSION: u8 = 109;

/// Oldest vanilla version byte accepted for playback.
pub const OLDEST_VANILLA_VERSION: u8 = 106;

/// Reserved version byte marking expanded turn resolution.
pub const LONGTICS_VERSION: u8 = 111;

/// End-of-stream sentinel, stored where a forward-move byte would be.
pub const DEMO_MARKER: u8 = 0x80;

/// Encoded header size: version, 3 game bytes, 4 mode flags, console
/// player, and one occupancy byte per slot.
pub const HEADER_SIZE: usize = 9 + MAX_PARTICIPANTS;

/// Default growth increment of the recording buffer, in bytes.
pub const DEFAULT_GROWTH_BYTES: usize = 128 * 1024;

/// Whether `version` is a version byte this codec can play back.
pub fn is_supported_version(version: u8) -> bool {
    (OLDEST_VANILLA_VERSION..=VANILLA_VERSION).contains(&version) || version == LONGTICS_VERSION
}
