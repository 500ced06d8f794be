//! Clearing one-shot fields on duplicated sub-steps.
//!
//! With a duplication factor above one, every produced unit runs several
//! logical steps. Movement repeats unchanged, but chat characters and
//! meta actions (pause, save request) must fire only on the first
//! sub-step.

use ticsync_core::{Buttons, CommandBatch};

/// Prepare `batch` for its next duplicated sub-step.
///
/// Clears every slot's chat character and, where the special bit is set,
/// the whole button byte. Returns whether anything changed.
pub fn squash(batch: &mut CommandBatch) -> bool {
    let mut changed = false;
    for cmd in batch.commands.iter_mut() {
        if cmd.chat_char != 0 {
            cmd.chat_char = 0;
            changed = true;
        }
        if cmd.buttons.is_special() {
            cmd.buttons = Buttons(0);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ticsync_core::CommandRecord;

    #[test]
    fn clears_chat_and_special_buttons() {
        let mut batch = CommandBatch::default();
        batch.commands[0] = CommandRecord {
            forward_move: 50,
            chat_char: b'h',
            buttons: Buttons::special(Buttons::PAUSE),
            ..CommandRecord::default()
        };
        batch.in_game[0] = true;

        assert!(squash(&mut batch));
        let cmd = batch.commands[0];
        assert_eq!(cmd.chat_char, 0);
        assert_eq!(cmd.buttons, Buttons(0));
        assert_eq!(cmd.forward_move, 50);
        assert!(batch.in_game[0]);
    }

    #[test]
    fn keeps_gameplay_buttons() {
        let mut batch = CommandBatch::default();
        batch.commands[1].buttons = Buttons::weapon_change(2).with(Buttons::ATTACK);
        assert!(!squash(&mut batch));
        assert_eq!(batch.commands[1].buttons.weapon(), Some(2));
    }

    proptest! {
        #[test]
        fn squash_is_idempotent(
            chat in any::<u8>(),
            buttons in any::<u8>(),
            forward in any::<i8>(),
            turn in any::<i16>(),
        ) {
            let mut batch = CommandBatch::default();
            for cmd in batch.commands.iter_mut() {
                *cmd = CommandRecord {
                    forward_move: forward,
                    angle_turn: turn,
                    chat_char: chat,
                    buttons: Buttons(buttons),
                    ..CommandRecord::default()
                };
            }
            squash(&mut batch);
            let once = batch;
            prop_assert!(!squash(&mut batch));
            prop_assert_eq!(batch, once);

            for cmd in &batch.commands {
                prop_assert_eq!(cmd.chat_char, 0);
                prop_assert_eq!(cmd.forward_move, forward);
                prop_assert_eq!(cmd.angle_turn, turn);
                if buttons & Buttons::SPECIAL != 0 {
                    prop_assert_eq!(cmd.buttons, Buttons(0));
                } else {
                    prop_assert_eq!(cmd.buttons, Buttons(buttons));
                }
            }
        }
    }
}
