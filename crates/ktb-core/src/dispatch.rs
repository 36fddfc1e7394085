use crate::command::{Block, Command};
use crate::context::{ContextId, KeyContextTable};
use crate::error::QueueError;
use crossbeam_channel::{Sender, TrySendError};
use tracing::debug;

/// Downstream consumer of resolved commands.
pub trait CommandQueue {
    fn enqueue(&mut self, command: Command) -> Result<(), QueueError>;
}

/// Records every command, in order.
impl CommandQueue for Vec<Command> {
    fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        self.push(command);
        Ok(())
    }
}

/// Never blocks: a full bounded channel drops the command.
impl CommandQueue for Sender<Command> {
    fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        self.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Disconnected,
        })
    }
}

impl<Q: CommandQueue + ?Sized> CommandQueue for Box<Q> {
    fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        (**self).enqueue(command)
    }
}

impl<Q: CommandQueue + ?Sized> CommandQueue for &mut Q {
    fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        (**self).enqueue(command)
    }
}

/// Context selection of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextState {
    pub current: ContextId,
    /// Context restored at every press; temporary contexts never become persistent.
    pub persistent: ContextId,
}

impl ContextState {
    pub const fn new(context: ContextId) -> Self {
        Self {
            current: context,
            persistent: context,
        }
    }
}

impl Default for ContextState {
    fn default() -> Self {
        Self::new(ContextId::DEFAULT)
    }
}

/// Applies context switches locally and forwards everything else to `queue`.
///
/// A context switch is forwarded as a no-op. Returns the forwarded command.
pub fn process_command<Q: CommandQueue + ?Sized>(
    contexts: &KeyContextTable,
    state: &mut ContextState,
    queue: &mut Q,
    command: Command,
) -> Command {
    let forwarded = if command.block == Block::CONTEXT {
        if !command.is_delayed() {
            switch_context(contexts, state, command.arg);
        }
        Command::NOOP
    } else {
        command
    };

    if let Err(err) = queue.enqueue(forwarded) {
        debug!("Command {} not delivered: {}", forwarded, err);
    }
    forwarded
}

fn switch_context(contexts: &KeyContextTable, state: &mut ContextState, arg: u8) {
    let Some(target) = ContextId::offset(arg) else {
        return;
    };
    let Some(ctx) = contexts.get(target) else {
        debug!("Ignoring switch to undefined context {}", target);
        return;
    };

    state.current = target;
    if !ctx.is_temporary() {
        state.persistent = target;
    }
}
