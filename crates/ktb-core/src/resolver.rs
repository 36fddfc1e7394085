use crate::command::Command;
use crate::context::{ContextId, KeyContextTable};
use crate::pressed::PressedKeys;
use crate::types::{HotkeyEntry, KeyBinding, KeyCombination, KeyValue, MAX_MODIFIERS_PER_COMBINATION};

/// Outcome of looking up the held keys in one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMatch<'a> {
    Matched {
        binding: &'a KeyBinding,
        command: Command,
    },
    /// The held keys are the prefix of a longer binding.
    Incomplete,
    NoMatch,
}

impl BindingMatch<'_> {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, BindingMatch::Incomplete)
    }
}

/// Looks up the held keys, with `immediate` as the completing key, in `context`.
///
/// Group keys (those outside the default set) are compared by set only, so one
/// wildcard binding covers every key of the group.
pub fn find_key_binding<'a>(
    contexts: &'a KeyContextTable,
    context: ContextId,
    pressed: &PressedKeys,
    immediate: Option<KeyValue>,
) -> BindingMatch<'a> {
    let Some(ctx) = contexts.get(context) else {
        return BindingMatch::NoMatch;
    };

    if ctx.bindings().is_empty() || pressed.len() > MAX_MODIFIERS_PER_COMBINATION {
        return BindingMatch::NoMatch;
    }

    let target = KeyCombination::pattern(pressed.as_slice(), immediate);
    match ctx.binding(&target) {
        Some(binding) => match binding.command {
            Some(command) => BindingMatch::Matched { binding, command },
            None => BindingMatch::Incomplete,
        },
        None => BindingMatch::NoMatch,
    }
}

pub fn find_hotkey_entry(
    contexts: &KeyContextTable,
    context: ContextId,
    key: KeyValue,
) -> Option<&HotkeyEntry> {
    contexts.get(context)?.hotkey(key)
}
