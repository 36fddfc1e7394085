use crate::command::{Command, CommandFlags};
use crate::context::{ContextId, KeyContextTable};
use crate::dispatch::{process_command, CommandQueue, ContextState};
use crate::keyboard::make_keyboard_command;
use crate::pressed::PressedKeys;
use crate::resolver::{find_hotkey_entry, find_key_binding, BindingMatch};
use crate::types::{BindingFlags, KeyValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Classification of one processed key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTableState {
    Unbound,
    Hotkey,
    /// The held keys are a prefix of a longer binding.
    Modifiers,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_context: ContextId,
    pub log_key_events: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_context: ContextId::DEFAULT,
            log_key_events: false,
        }
    }
}

/// The command committed by the current combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeldCommand {
    /// As bound, before adjustment; sent again on release.
    command: Command,
    /// Committed by its immediate key rather than derived from held modifiers.
    immediate: bool,
}

#[derive(Debug, Clone, Copy)]
struct Resolution {
    command: Command,
    flags: BindingFlags,
    immediate: bool,
}

impl Resolution {
    fn new(binding_flags: BindingFlags, command: Command, immediate: bool) -> Self {
        Self {
            command,
            flags: binding_flags,
            immediate,
        }
    }
}

/// Per-session key state. One per input device; calls must be serialized.
pub struct KeyTable<Q> {
    contexts: Arc<KeyContextTable>,
    state: ContextState,
    pressed: PressedKeys,
    held: Option<HeldCommand>,
    log_key_events: bool,
    queue: Q,
}

impl<Q: CommandQueue> KeyTable<Q> {
    pub fn new(contexts: Arc<KeyContextTable>, queue: Q) -> Self {
        Self::with_config(contexts, queue, SessionConfig::default())
    }

    pub fn with_config(contexts: Arc<KeyContextTable>, queue: Q, config: SessionConfig) -> Self {
        let initial = if contexts.contains(config.initial_context) {
            config.initial_context
        } else {
            warn!(
                "Initial context {} is not defined, starting in the default context",
                config.initial_context
            );
            ContextId::DEFAULT
        };

        Self {
            contexts,
            state: ContextState::new(initial),
            pressed: PressedKeys::new(),
            held: None,
            log_key_events: config.log_key_events,
            queue,
        }
    }

    /// Enables the per-event diagnostic line. There is no way to turn it off again.
    pub fn log_key_events(&mut self) {
        self.log_key_events = true;
    }

    pub fn is_logging_key_events(&self) -> bool {
        self.log_key_events
    }

    pub fn current_context(&self) -> ContextId {
        self.state.current
    }

    pub fn persistent_context(&self) -> ContextId {
        self.state.persistent
    }

    pub fn pressed_keys(&self) -> &PressedKeys {
        &self.pressed
    }

    /// The command held by the current combination, as bound.
    pub fn held_command(&self) -> Option<Command> {
        self.held.map(|held| held.command)
    }

    pub fn is_immediate(&self) -> bool {
        self.held.is_some_and(|held| held.immediate)
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    /// Feeds one physical key transition. Passing [`ContextId::DEFAULT`] resolves
    /// in the current context.
    pub fn process_key_event(
        &mut self,
        context: ContextId,
        set: u8,
        key: u8,
        press: bool,
    ) -> KeyTableState {
        let key_value = KeyValue::new(set, key);
        let context = if context == ContextId::DEFAULT {
            self.state.current
        } else {
            context
        };
        if press {
            self.state.current = self.state.persistent;
        }

        let mut dispatched = None;
        let hotkey = find_hotkey_entry(&self.contexts, context, key_value).map(|hotkey| {
            if press {
                hotkey.press_command
            } else {
                hotkey.release_command
            }
        });

        let state = if let Some(command) = hotkey {
            if command != Command::NOOP {
                self.dispatch(command);
                dispatched = Some(command);
            }
            KeyTableState::Hotkey
        } else {
            let position = match self.pressed.find(&key_value) {
                Ok(position) => {
                    self.pressed.remove(position);
                    position
                }
                Err(position) => position,
            };

            if press {
                self.press(context, key_value, position, &mut dispatched)
            } else {
                self.release(&mut dispatched);
                KeyTableState::Unbound
            }
        };

        if self.log_key_events {
            debug!("{}", describe_key_event(press, context, set, key, dispatched));
        }

        state
    }

    fn press(
        &mut self,
        context: ContextId,
        key_value: KeyValue,
        position: usize,
        dispatched: &mut Option<Command>,
    ) -> KeyTableState {
        let (resolution, incomplete) = self.resolve(context, key_value, position);

        let Some(resolution) = resolution else {
            if self.held.take().is_some() {
                self.dispatch(Command::NOOP);
                *dispatched = Some(Command::NOOP);
            }
            return if incomplete {
                KeyTableState::Modifiers
            } else {
                KeyTableState::Unbound
            };
        };

        if self.held_command() != Some(resolution.command) {
            let mut command = resolution.command;
            if resolution.flags.contains(BindingFlags::ADJUST) {
                if let Some(group_key) = self.pressed.iter().find(|key| !key.is_default_set()) {
                    command.arg = command.arg.wrapping_add(group_key.key);
                }
            }

            self.held = Some(HeldCommand {
                command: resolution.command,
                immediate: resolution.immediate,
            });

            command.flags |= if resolution.immediate {
                CommandFlags::REPEAT_INITIAL | CommandFlags::REPEAT_DELAY
            } else {
                CommandFlags::REPEAT_DELAY
            };

            self.dispatch(command);
            *dispatched = Some(command);
        }

        KeyTableState::Command
    }

    fn release(&mut self, dispatched: &mut Option<Command>) {
        if let Some(held) = self.held.take() {
            let command = if held.immediate {
                Command::NOOP
            } else {
                held.command
            };
            self.dispatch(command);
            *dispatched = Some(command);
        }
    }

    /// Resolution order: exact match, modifiers-only probe, keyboard emulation,
    /// then exact match and probe again in the default context. The exact attempts
    /// run with `key_value` taken out of the held keys; it is held again afterwards.
    fn resolve(
        &mut self,
        context: ContextId,
        key_value: KeyValue,
        position: usize,
    ) -> (Option<Resolution>, bool) {
        let contexts = &*self.contexts;
        let pressed = &mut self.pressed;
        let mut incomplete = false;

        let mut lookup = |context: ContextId, pressed: &PressedKeys, immediate: Option<KeyValue>| {
            match find_key_binding(contexts, context, pressed, immediate) {
                BindingMatch::Matched { binding, command } => {
                    Some(Resolution::new(binding.flags, command, immediate.is_some()))
                }
                BindingMatch::Incomplete => {
                    incomplete = true;
                    None
                }
                BindingMatch::NoMatch => None,
            }
        };

        let exact = lookup(context, &*pressed, Some(key_value));
        pressed.insert(key_value, position);

        let resolution = exact
            .or_else(|| lookup(context, &*pressed, None))
            .or_else(|| {
                make_keyboard_command(contexts, context, self.state.persistent, &*pressed)
                    .map(|command| Resolution::new(BindingFlags::empty(), command, false))
            })
            .or_else(|| {
                if context == ContextId::DEFAULT {
                    return None;
                }
                pressed.remove(position);
                let exact = lookup(ContextId::DEFAULT, &*pressed, Some(key_value));
                pressed.insert(key_value, position);
                exact.or_else(|| lookup(ContextId::DEFAULT, &*pressed, None))
            });

        (resolution, incomplete)
    }

    fn dispatch(&mut self, command: Command) {
        process_command(&self.contexts, &mut self.state, &mut self.queue, command);
    }
}

/// The diagnostic line for one key event.
pub fn describe_key_event(
    press: bool,
    context: ContextId,
    set: u8,
    key: u8,
    command: Option<Command>,
) -> String {
    let mut line = format!(
        "Key {}: Ctx:{} Set:{} Key:{}",
        if press { "Press" } else { "Release" },
        context,
        set,
        key
    );
    if let Some(command) = command {
        line.push_str(&format!(" Cmd:{}", command));
    }
    line
}
