use crate::context::ContextId;
use crate::types::{KeyCombination, KeyValue};
use thiserror::Error;

/// Errors raised while building a key context table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("no default context defined")]
    MissingDefaultContext,

    #[error("context {0} defined more than once")]
    DuplicateContext(ContextId),

    #[error("context {context}: {combination} has {count} modifiers (maximum {max})")]
    TooManyModifiers {
        context: ContextId,
        combination: KeyCombination,
        count: usize,
        max: usize,
    },

    #[error("context {context}: duplicate key combination {combination}")]
    DuplicateBinding {
        context: ContextId,
        combination: KeyCombination,
    },

    #[error("context {context}: duplicate hotkey {key}")]
    DuplicateHotkey { context: ContextId, key: KeyValue },
}

/// Errors reported by a downstream command queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("command receiver disconnected")]
    Disconnected,

    #[error("command queue is full")]
    Full,
}
