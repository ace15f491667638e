pub mod clipboard;
pub mod commands;
pub mod editor;
pub mod events;
pub mod selection;
pub mod ticker;

pub use clipboard::{Clipboard, ClipboardError};
pub use commands::{Command, CommandStack};
pub use editor::{Editor, Nudge};
pub use events::{ChangeEvent, EventBus, SubscriptionId};
pub use selection::Selection;
pub use ticker::ContentTicker;
