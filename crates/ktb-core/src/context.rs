use crate::command::{Command, CommandFlags};
use crate::error::TableError;
use crate::types::{
    BindingFlags, HotkeyEntry, KeyBinding, KeyCombination, KeyValue, KEY_WILDCARD,
    MAX_MODIFIERS_PER_COMBINATION,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use tracing::{info, warn};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContextId(pub u8);

impl ContextId {
    /// The normal working context. Passed to the event engine, it stands for
    /// "whatever context is current".
    pub const DEFAULT: ContextId = ContextId(0);
    /// Pseudo-context interpreting the held keys as a braille chord.
    pub const CHORDS: ContextId = ContextId(1);

    /// Target of a context-switch command with the given argument.
    pub fn offset(arg: u8) -> Option<ContextId> {
        Self::DEFAULT.0.checked_add(arg).map(ContextId)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a default-set key during braille keyboard emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardFunction {
    #[default]
    None,
    Dot1,
    Dot2,
    Dot3,
    Dot4,
    Dot5,
    Dot6,
    Dot7,
    Dot8,
    Space,
    Shift,
    Uppercase,
    Control,
    Meta,
}

impl KeyboardFunction {
    /// Bits this function contributes to a composed character, `None` for keys
    /// without a keyboard role.
    pub const fn bits(self) -> Option<KeyboardBits> {
        let (dots, flags) = match self {
            KeyboardFunction::None => return None,
            KeyboardFunction::Dot1 => (0x01, CommandFlags::empty()),
            KeyboardFunction::Dot2 => (0x02, CommandFlags::empty()),
            KeyboardFunction::Dot3 => (0x04, CommandFlags::empty()),
            KeyboardFunction::Dot4 => (0x08, CommandFlags::empty()),
            KeyboardFunction::Dot5 => (0x10, CommandFlags::empty()),
            KeyboardFunction::Dot6 => (0x20, CommandFlags::empty()),
            KeyboardFunction::Dot7 => (0x40, CommandFlags::empty()),
            KeyboardFunction::Dot8 => (0x80, CommandFlags::empty()),
            KeyboardFunction::Space => (0, CommandFlags::empty()),
            KeyboardFunction::Shift => (0, CommandFlags::CHAR_SHIFT),
            KeyboardFunction::Uppercase => (0, CommandFlags::CHAR_UPPER),
            KeyboardFunction::Control => (0, CommandFlags::CHAR_CONTROL),
            KeyboardFunction::Meta => (0, CommandFlags::CHAR_META),
        };
        Some(KeyboardBits { dots, flags })
    }
}

/// Dots and character modifiers accumulated into a pass-dots command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardBits {
    pub dots: u8,
    pub flags: CommandFlags,
}

impl KeyboardBits {
    pub const fn is_empty(self) -> bool {
        self.dots == 0 && self.flags.is_empty()
    }
}

impl BitOr for KeyboardBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            dots: self.dots | rhs.dots,
            flags: self.flags | rhs.flags,
        }
    }
}

impl BitOrAssign for KeyboardBits {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

pub type KeyMap = HashMap<u8, KeyboardFunction>;

/// One binding context. Bindings and hotkeys are sorted once at build time and
/// never change afterwards.
#[derive(Debug, Clone)]
pub struct KeyContext {
    id: ContextId,
    title: Option<String>,
    bindings: Vec<KeyBinding>,
    hotkeys: Vec<HotkeyEntry>,
    key_map: Option<KeyMap>,
    superimposed: KeyboardBits,
    temporary: bool,
}

impl KeyContext {
    pub fn builder(id: ContextId) -> KeyContextBuilder {
        KeyContextBuilder::new(id)
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    pub fn hotkeys(&self) -> &[HotkeyEntry] {
        &self.hotkeys
    }

    pub fn key_map(&self) -> Option<&KeyMap> {
        self.key_map.as_ref()
    }

    pub fn superimposed(&self) -> KeyboardBits {
        self.superimposed
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn binding(&self, combination: &KeyCombination) -> Option<&KeyBinding> {
        self.bindings
            .binary_search_by(|binding| binding.combination.cmp(combination))
            .ok()
            .map(|index| &self.bindings[index])
    }

    pub fn hotkey(&self, key: KeyValue) -> Option<&HotkeyEntry> {
        self.hotkeys
            .binary_search_by(|hotkey| hotkey.key.cmp(&key))
            .ok()
            .map(|index| &self.hotkeys[index])
    }
}

#[derive(Debug, Clone)]
pub struct KeyContextBuilder {
    id: ContextId,
    title: Option<String>,
    bindings: Vec<KeyBinding>,
    hotkeys: Vec<HotkeyEntry>,
    key_map: Option<KeyMap>,
    superimposed: KeyboardBits,
    temporary: bool,
}

impl KeyContextBuilder {
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            title: None,
            bindings: Vec::new(),
            hotkeys: Vec::new(),
            key_map: None,
            superimposed: KeyboardBits::default(),
            temporary: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn binding(mut self, binding: KeyBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn bind(self, combination: KeyCombination, command: Command) -> Self {
        self.binding(KeyBinding::new(combination, command))
    }

    pub fn bind_adjusted(self, combination: KeyCombination, command: Command) -> Self {
        self.binding(KeyBinding::new(combination, command).with_flags(BindingFlags::ADJUST))
    }

    /// Marks `combination` as the held prefix of longer bindings.
    pub fn incomplete(self, combination: KeyCombination) -> Self {
        self.binding(KeyBinding::incomplete(combination))
    }

    pub fn hotkey(mut self, key: KeyValue, press_command: Command, release_command: Command) -> Self {
        self.hotkeys.push(HotkeyEntry {
            key,
            press_command,
            release_command,
        });
        self
    }

    pub fn key_map(mut self, entries: impl IntoIterator<Item = (u8, KeyboardFunction)>) -> Self {
        self.key_map
            .get_or_insert_with(KeyMap::new)
            .extend(entries);
        self
    }

    pub fn superimposed(mut self, bits: KeyboardBits) -> Self {
        self.superimposed = bits;
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn build(self) -> Result<KeyContext, TableError> {
        let id = self.id;
        let mut bindings = self.bindings;
        let mut hotkeys = self.hotkeys;

        for binding in &bindings {
            let combination = &binding.combination;
            let count = combination.modifiers().len();
            if count > MAX_MODIFIERS_PER_COMBINATION {
                return Err(TableError::TooManyModifiers {
                    context: id,
                    combination: combination.clone(),
                    count,
                    max: MAX_MODIFIERS_PER_COMBINATION,
                });
            }
            if combination.keys().any(|key| key.pattern() != key) {
                warn!(
                    "Context {}: {} names a group key by code and can never match",
                    id, combination
                );
            }
            if combination
                .keys()
                .any(|key| key.is_default_set() && key.is_wildcard())
            {
                warn!(
                    "Context {}: {} uses the wildcard code in the default set and only matches key {}",
                    id, combination, KEY_WILDCARD
                );
            }
        }

        bindings.sort_by(|a, b| a.combination.cmp(&b.combination));
        if let Some(pair) = bindings
            .windows(2)
            .find(|pair| pair[0].combination == pair[1].combination)
        {
            return Err(TableError::DuplicateBinding {
                context: id,
                combination: pair[0].combination.clone(),
            });
        }

        hotkeys.sort_by_key(|hotkey| hotkey.key);
        if let Some(pair) = hotkeys.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(TableError::DuplicateHotkey {
                context: id,
                key: pair[0].key,
            });
        }
        for hotkey in hotkeys.iter().filter(|hotkey| hotkey.key.is_wildcard()) {
            warn!(
                "Context {}: wildcard hotkey {} can never match",
                id, hotkey.key
            );
        }

        Ok(KeyContext {
            id,
            title: self.title,
            bindings,
            hotkeys,
            key_map: self.key_map,
            superimposed: self.superimposed,
            temporary: self.temporary,
        })
    }
}

/// The loaded set of contexts, shared read-only between sessions.
#[derive(Debug, Clone)]
pub struct KeyContextTable {
    contexts: HashMap<ContextId, KeyContext>,
}

impl KeyContextTable {
    pub fn new(contexts: impl IntoIterator<Item = KeyContext>) -> Result<Self, TableError> {
        let mut table = HashMap::new();
        for context in contexts {
            let id = context.id;
            if table.insert(id, context).is_some() {
                return Err(TableError::DuplicateContext(id));
            }
        }

        if !table.contains_key(&ContextId::DEFAULT) {
            return Err(TableError::MissingDefaultContext);
        }

        info!(
            "Key table loaded with {} contexts, {} bindings, {} hotkeys.",
            table.len(),
            table.values().map(|c| c.bindings.len()).sum::<usize>(),
            table.values().map(|c| c.hotkeys.len()).sum::<usize>()
        );

        Ok(Self { contexts: table })
    }

    pub fn get(&self, id: ContextId) -> Option<&KeyContext> {
        self.contexts.get(&id)
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.contexts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn kv(set: u8, key: u8) -> KeyValue {
        KeyValue::new(set, key)
    }

    fn default_context() -> KeyContext {
        KeyContext::builder(ContextId::DEFAULT)
            .build()
            .expect("empty context")
    }

    #[test]
    fn test_bindings_are_sorted_for_lookup() {
        let ctx = KeyContext::builder(ContextId::DEFAULT)
            .bind(KeyCombination::new([kv(0, 3)], None), Command::simple(3))
            .bind(KeyCombination::new([], Some(kv(0, 9))), Command::simple(9))
            .bind(KeyCombination::new([kv(0, 1)], Some(kv(0, 2))), Command::simple(2))
            .build()
            .unwrap();

        let combos: Vec<_> = ctx.bindings().iter().map(|b| b.combination.clone()).collect();
        let mut sorted = combos.clone();
        sorted.sort();
        assert_eq!(combos, sorted);

        let found = ctx
            .binding(&KeyCombination::new([kv(0, 1)], Some(kv(0, 2))))
            .and_then(|b| b.command);
        assert_eq!(found, Some(Command::simple(2)));
        assert!(ctx.binding(&KeyCombination::new([kv(0, 1)], None)).is_none());
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let combination = KeyCombination::new([kv(0, 2), kv(0, 1)], None);
        let err = KeyContext::builder(ContextId(4))
            .bind(combination.clone(), Command::simple(1))
            .bind(KeyCombination::new([kv(0, 1), kv(0, 2)], None), Command::simple(2))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateBinding {
                context: ContextId(4),
                combination,
            }
        );
    }

    #[test]
    fn test_too_many_modifiers_rejected() {
        let keys = (0..=MAX_MODIFIERS_PER_COMBINATION as u8).map(|k| kv(0, k));
        let err = KeyContext::builder(ContextId::DEFAULT)
            .bind(KeyCombination::new(keys, None), Command::simple(1))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::TooManyModifiers { count, .. } if count == MAX_MODIFIERS_PER_COMBINATION + 1
        ));
    }

    #[test]
    fn test_hotkeys_sorted_and_unique() {
        let ctx = KeyContext::builder(ContextId::DEFAULT)
            .hotkey(kv(1, 4), Command::simple(4), Command::NOOP)
            .hotkey(kv(0, 5), Command::simple(5), Command::NOOP)
            .build()
            .unwrap();
        assert_eq!(ctx.hotkeys()[0].key, kv(0, 5));
        assert_eq!(ctx.hotkey(kv(1, 4)).map(|h| h.press_command), Some(Command::simple(4)));
        assert!(ctx.hotkey(kv(1, 5)).is_none());

        let err = KeyContext::builder(ContextId::DEFAULT)
            .hotkey(kv(0, 5), Command::simple(1), Command::NOOP)
            .hotkey(kv(0, 5), Command::simple(2), Command::NOOP)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateHotkey {
                context: ContextId::DEFAULT,
                key: kv(0, 5),
            }
        );
    }

    #[test]
    fn test_table_requires_default_context() {
        let other = KeyContext::builder(ContextId(3)).build().unwrap();
        assert_eq!(
            KeyContextTable::new([other]).unwrap_err(),
            TableError::MissingDefaultContext
        );
    }

    #[test]
    fn test_table_rejects_duplicate_ids() {
        assert_eq!(
            KeyContextTable::new([default_context(), default_context()]).unwrap_err(),
            TableError::DuplicateContext(ContextId::DEFAULT)
        );
    }

    #[test]
    fn test_keyboard_function_bits() {
        assert_eq!(KeyboardFunction::None.bits(), None);
        assert_eq!(KeyboardFunction::Space.bits(), Some(KeyboardBits::default()));
        assert_eq!(KeyboardFunction::Dot8.bits().map(|b| b.dots), Some(0x80));
        let shift = KeyboardFunction::Shift.bits().unwrap();
        assert_eq!(shift.dots, 0);
        assert_eq!(shift.flags, CommandFlags::CHAR_SHIFT);
    }

    #[test]
    fn test_context_offset() {
        assert_eq!(ContextId::offset(2), Some(ContextId(2)));
        assert_eq!(ContextId::offset(u8::MAX), Some(ContextId(u8::MAX)));
    }
}
