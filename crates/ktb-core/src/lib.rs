pub mod command;
pub mod context;
pub mod definition;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod pressed;
pub mod resolver;
pub mod session;
pub mod types;

pub use command::{Block, Command, CommandFlags};
pub use context::{ContextId, KeyContext, KeyContextTable, KeyboardBits, KeyboardFunction};
pub use dispatch::CommandQueue;
pub use engine::{KeyTable, KeyTableState, SessionConfig};
pub use error::{QueueError, TableError};
pub use session::{pump_events, KeyEvent, SharedKeyTable};
pub use types::{KeyCombination, KeyValue, KEY_SET_DEFAULT, KEY_WILDCARD};
