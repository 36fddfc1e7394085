use crate::command::Command;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

/// Key set whose keys are matched by exact key code.
pub const KEY_SET_DEFAULT: u8 = 0;

/// Key code meaning "any key of this set" in group sets. The default set matches by
/// exact code, so there it names plain key 255; that code is reserved for wildcards.
pub const KEY_WILDCARD: u8 = u8::MAX;

pub const MAX_MODIFIERS_PER_COMBINATION: usize = 10;

/// A physical key: the group (device set) it belongs to and its code within that group.
///
/// Ordered by set, then by key. [`KEY_WILDCARD`] is the largest code, so a wildcard
/// sorts after every concrete key of its set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue {
    pub set: u8,
    pub key: u8,
}

impl KeyValue {
    pub const fn new(set: u8, key: u8) -> Self {
        Self { set, key }
    }

    pub const fn wildcard(set: u8) -> Self {
        Self {
            set,
            key: KEY_WILDCARD,
        }
    }

    pub const fn is_wildcard(self) -> bool {
        self.key == KEY_WILDCARD
    }

    pub const fn is_default_set(self) -> bool {
        self.set == KEY_SET_DEFAULT
    }

    /// The form this key takes inside a search pattern: keys outside the default
    /// set only match by set membership.
    pub const fn pattern(self) -> Self {
        if self.is_default_set() {
            self
        } else {
            Self::wildcard(self.set)
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            write!(f, "{}.*", self.set)
        } else {
            write!(f, "{}.{}", self.set, self.key)
        }
    }
}

pub type Modifiers = SmallVec<[KeyValue; MAX_MODIFIERS_PER_COMBINATION]>;

/// A key pattern: a sorted set of modifier keys plus an optional immediate key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    modifiers: Modifiers,
    immediate: Option<KeyValue>,
}

impl KeyCombination {
    pub fn new(modifiers: impl IntoIterator<Item = KeyValue>, immediate: Option<KeyValue>) -> Self {
        let mut modifiers: Modifiers = modifiers.into_iter().collect();
        modifiers.sort_unstable();
        Self {
            modifiers,
            immediate,
        }
    }

    /// Builds the search pattern for a set of held keys. `pressed` must already be
    /// sorted; rewriting to wildcards keeps it sorted.
    pub fn pattern(pressed: &[KeyValue], immediate: Option<KeyValue>) -> Self {
        Self {
            modifiers: pressed.iter().map(|key| key.pattern()).collect(),
            immediate: immediate.map(KeyValue::pattern),
        }
    }

    pub fn modifiers(&self) -> &[KeyValue] {
        &self.modifiers
    }

    pub fn immediate(&self) -> Option<KeyValue> {
        self.immediate
    }

    pub fn has_immediate(&self) -> bool {
        self.immediate.is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = KeyValue> + '_ {
        self.modifiers.iter().copied().chain(self.immediate)
    }
}

/// Combinations with an immediate key sort first, ordered by that key; then by
/// modifier count; then by the modifiers themselves.
impl Ord for KeyCombination {
    fn cmp(&self, other: &Self) -> Ordering {
        let immediate = match (self.immediate, other.immediate) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        immediate
            .then_with(|| self.modifiers.len().cmp(&other.modifiers.len()))
            .then_with(|| self.modifiers.as_slice().cmp(other.modifiers.as_slice()))
    }
}

impl PartialOrd for KeyCombination {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for modifier in &self.modifiers {
            if !first {
                f.write_str("+")?;
            }
            write!(f, "{}", modifier)?;
            first = false;
        }
        if let Some(immediate) = self.immediate {
            if !first {
                f.write_str("+")?;
            }
            write!(f, "!{}", immediate)?;
        }
        Ok(())
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BindingFlags: u8 {
        /// Add the code of the held group key to the command argument.
        const ADJUST = 0b0001;
    }
}

/// A combination bound to a command. A `None` command marks the combination as
/// the prefix of longer bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub combination: KeyCombination,
    pub command: Option<Command>,
    pub flags: BindingFlags,
}

impl KeyBinding {
    pub fn new(combination: KeyCombination, command: Command) -> Self {
        Self {
            combination,
            command: Some(command),
            flags: BindingFlags::empty(),
        }
    }

    pub fn incomplete(combination: KeyCombination) -> Self {
        Self {
            combination,
            command: None,
            flags: BindingFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: BindingFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A single key whose press and release bypass combination resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEntry {
    pub key: KeyValue,
    pub press_command: Command,
    pub release_command: Command,
}
