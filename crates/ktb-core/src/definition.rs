//! Format-independent description of a key table.
//!
//! Any serde format can produce a [`KeyTableDefinition`]; compiling it sorts and
//! validates every context.

use crate::command::Command;
use crate::context::{ContextId, KeyContext, KeyContextTable, KeyboardBits, KeyboardFunction};
use crate::error::TableError;
use crate::types::{BindingFlags, KeyBinding, KeyCombination, KeyValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyTableDefinition {
    pub contexts: Vec<KeyContextDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyContextDefinition {
    pub id: ContextId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub bindings: Vec<BindingDefinition>,
    #[serde(default)]
    pub hotkeys: Vec<HotkeyDefinition>,
    /// Keyboard emulation roles by default-set key code.
    #[serde(default)]
    pub key_map: Option<Vec<(u8, KeyboardFunction)>>,
    #[serde(default)]
    pub superimposed: KeyboardBits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingDefinition {
    #[serde(default)]
    pub modifiers: Vec<KeyValue>,
    #[serde(default)]
    pub immediate: Option<KeyValue>,
    /// Absent for the prefix of longer combinations.
    #[serde(default)]
    pub command: Option<Command>,
    #[serde(default)]
    pub adjust: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyDefinition {
    pub key: KeyValue,
    #[serde(default = "noop")]
    pub press: Command,
    #[serde(default = "noop")]
    pub release: Command,
}

fn noop() -> Command {
    Command::NOOP
}

impl KeyContextDefinition {
    pub fn compile(self) -> Result<KeyContext, TableError> {
        let mut builder = KeyContext::builder(self.id)
            .temporary(self.temporary)
            .superimposed(self.superimposed);

        if let Some(title) = self.title {
            builder = builder.title(title);
        }

        if let Some(key_map) = self.key_map {
            builder = builder.key_map(key_map);
        }

        for binding in self.bindings {
            let combination = KeyCombination::new(binding.modifiers, binding.immediate);
            let flags = if binding.adjust {
                BindingFlags::ADJUST
            } else {
                BindingFlags::empty()
            };
            builder = builder.binding(KeyBinding {
                combination,
                command: binding.command,
                flags,
            });
        }

        for hotkey in self.hotkeys {
            builder = builder.hotkey(hotkey.key, hotkey.press, hotkey.release);
        }

        builder.build()
    }
}

impl KeyTableDefinition {
    pub fn compile(self) -> Result<KeyContextTable, TableError> {
        let contexts = self
            .contexts
            .into_iter()
            .map(KeyContextDefinition::compile)
            .collect::<Result<Vec<_>, _>>()?;
        KeyContextTable::new(contexts)
    }
}

impl TryFrom<KeyTableDefinition> for KeyContextTable {
    type Error = TableError;

    fn try_from(definition: KeyTableDefinition) -> Result<Self, Self::Error> {
        definition.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(id: u8) -> KeyContextDefinition {
        KeyContextDefinition {
            id: ContextId(id),
            title: None,
            temporary: false,
            bindings: Vec::new(),
            hotkeys: Vec::new(),
            key_map: None,
            superimposed: KeyboardBits::default(),
        }
    }

    #[test]
    fn test_compile_builds_sorted_contexts() {
        let mut default = context(0);
        default.bindings.push(BindingDefinition {
            modifiers: vec![KeyValue::new(0, 4), KeyValue::new(0, 1)],
            immediate: None,
            command: Some(Command::simple(8)),
            adjust: false,
        });
        default.bindings.push(BindingDefinition {
            modifiers: Vec::new(),
            immediate: Some(KeyValue::wildcard(2)),
            command: Some(Command::new(crate::command::Block::ROUTE, 0)),
            adjust: true,
        });
        let mut menu = context(3);
        menu.temporary = true;
        menu.title = Some("menu".into());

        let table = KeyTableDefinition {
            contexts: vec![default, menu],
        }
        .compile()
        .expect("compile");

        let ctx = table.get(ContextId::DEFAULT).unwrap();
        assert_eq!(ctx.bindings().len(), 2);
        assert!(ctx.bindings()[0].combination.has_immediate());
        assert_eq!(ctx.bindings()[0].flags, BindingFlags::ADJUST);
        assert_eq!(
            ctx.bindings()[1].combination.modifiers(),
            &[KeyValue::new(0, 1), KeyValue::new(0, 4)]
        );

        let menu = table.get(ContextId(3)).unwrap();
        assert!(menu.is_temporary());
        assert_eq!(menu.title(), Some("menu"));
    }

    #[test]
    fn test_compile_propagates_context_errors() {
        let mut default = context(0);
        for _ in 0..2 {
            default.hotkeys.push(HotkeyDefinition {
                key: KeyValue::new(0, 5),
                press: Command::simple(1),
                release: Command::NOOP,
            });
        }
        let err = KeyContextTable::try_from(KeyTableDefinition {
            contexts: vec![default],
        })
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateHotkey { .. }));
    }
}
