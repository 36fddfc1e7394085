use crate::context::ContextId;
use crate::dispatch::CommandQueue;
use crate::engine::{KeyTable, KeyTableState};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// One physical key transition as reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    #[serde(default)]
    pub context: ContextId,
    pub set: u8,
    pub key: u8,
    pub press: bool,
}

impl KeyEvent {
    pub const fn press(set: u8, key: u8) -> Self {
        Self {
            context: ContextId::DEFAULT,
            set,
            key,
            press: true,
        }
    }

    pub const fn release(set: u8, key: u8) -> Self {
        Self {
            context: ContextId::DEFAULT,
            set,
            key,
            press: false,
        }
    }
}

impl<Q: CommandQueue> KeyTable<Q> {
    pub fn process(&mut self, event: KeyEvent) -> KeyTableState {
        self.process_key_event(event.context, event.set, event.key, event.press)
    }
}

/// A session fed by several input sources; the mutex serializes their events.
pub struct SharedKeyTable<Q> {
    inner: Arc<Mutex<KeyTable<Q>>>,
}

impl<Q> Clone for SharedKeyTable<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Q: CommandQueue> SharedKeyTable<Q> {
    pub fn new(table: KeyTable<Q>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    pub fn process(&self, event: KeyEvent) -> KeyTableState {
        self.inner.lock().process(event)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut KeyTable<Q>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

/// Feeds events from `events` into `table` until every sender is gone.
/// Returns the number of events processed.
pub fn pump_events<Q: CommandQueue>(events: &Receiver<KeyEvent>, table: &SharedKeyTable<Q>) -> usize {
    info!("Key event pump started.");
    let mut count = 0;
    for event in events.iter() {
        table.process(event);
        count += 1;
    }
    info!("Key event pump stopped after {} events.", count);
    count
}
