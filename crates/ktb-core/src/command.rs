use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command block: selects how the argument of a command is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(pub u8);

impl Block {
    /// Simple commands; the argument is the command number.
    pub const COMMAND: Block = Block(0x00);
    /// Route the cursor to the cell given by the argument.
    pub const ROUTE: Block = Block(0x01);
    /// Type the braille character whose dots are the argument.
    pub const PASSDOTS: Block = Block(0x22);
    /// Switch to context `ContextId::DEFAULT + argument`.
    pub const CONTEXT: Block = Block(0x25);
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CommandFlags: u32 {
        const CHAR_SHIFT = 0x01_0000;
        const CHAR_UPPER = 0x02_0000;
        const CHAR_CONTROL = 0x04_0000;
        const CHAR_META = 0x08_0000;
        /// Braille chord typed together with the space bar.
        const DOT_CHORD = 0x10_0000;
        const REPEAT_DELAY = 0x40_0000;
        const REPEAT_INITIAL = 0x80_0000;

        const CHAR_MODIFIERS = Self::CHAR_SHIFT.bits()
            | Self::CHAR_UPPER.bits()
            | Self::CHAR_CONTROL.bits()
            | Self::CHAR_META.bits();
        const REPEAT = Self::REPEAT_DELAY.bits() | Self::REPEAT_INITIAL.bits();
    }
}

/// A resolved command: block, argument and flags, compared structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub block: Block,
    #[serde(default)]
    pub arg: u8,
    #[serde(default)]
    pub flags: CommandFlags,
}

impl Command {
    pub const NOOP: Command = Command::simple(0);

    pub const fn new(block: Block, arg: u8) -> Self {
        Self {
            block,
            arg,
            flags: CommandFlags::empty(),
        }
    }

    pub const fn simple(number: u8) -> Self {
        Self::new(Block::COMMAND, number)
    }

    pub const fn context(offset: u8) -> Self {
        Self::new(Block::CONTEXT, offset)
    }

    pub const fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::NOOP
    }

    /// Delayed commands only take effect when the gesture that produced them ends.
    pub fn is_delayed(&self) -> bool {
        self.flags & CommandFlags::REPEAT == CommandFlags::REPEAT_DELAY
    }

    /// Packed numeric form, used for diagnostics.
    pub fn code(&self) -> u32 {
        (u32::from(self.block.0) << 8) | u32::from(self.arg) | self.flags.bits()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.code())
    }
}
