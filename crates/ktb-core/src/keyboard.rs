use crate::command::{Block, Command, CommandFlags};
use crate::context::{ContextId, KeyContextTable, KeyboardBits, KeyboardFunction};
use crate::pressed::PressedKeys;

/// Interprets the held keys as a braille keyboard chord.
///
/// Chords requested through [`ContextId::CHORDS`] are read with the key map of
/// the `persistent` context. Fails on group keys, on keys without a keyboard
/// role, and on chords that are empty or mix dots with space outside chord mode.
pub fn make_keyboard_command(
    contexts: &KeyContextTable,
    context: ContextId,
    persistent: ContextId,
    pressed: &PressedKeys,
) -> Option<Command> {
    let chords_requested = context == ContextId::CHORDS;
    let context = if chords_requested { persistent } else { context };
    let ctx = contexts.get(context)?;
    let key_map = ctx.key_map()?;

    let mut bits = KeyboardBits::default();
    let mut dot_pressed = false;
    let mut space_pressed = false;

    for key in pressed.iter() {
        if !key.is_default_set() {
            return None;
        }

        let function = key_map
            .get(&key.key)
            .copied()
            .unwrap_or(KeyboardFunction::None);
        let bit = function.bits()?;
        bits |= bit;

        if bit.is_empty() {
            space_pressed = true;
        } else if bit.dots != 0 {
            dot_pressed = true;
        }
    }

    if dot_pressed {
        bits |= ctx.superimposed();
    }

    let mut command = Command::new(Block::PASSDOTS, bits.dots).with_flags(bits.flags);

    if chords_requested && space_pressed {
        command.flags |= CommandFlags::DOT_CHORD;
    } else if dot_pressed == space_pressed {
        return None;
    }

    Some(command)
}
