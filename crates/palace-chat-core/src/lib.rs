pub mod chat_type;
pub mod config;
pub mod format;
pub mod state;
pub mod transport;
pub mod widget;

// Re-export main types for convenience
pub use chat_type::{ChatType, DEFAULT_CHAT_TYPE, KNOWN_CHAT_TYPES};
pub use config::Config;
pub use format::format_message;
pub use state::{ChatRole, Message, UiState};
pub use transport::{page_path, ChatClient, ChatReply, Transport, TransportError};
pub use widget::{ChatView, ChatWidget, Key, KeyDisposition, KeyPress, TurnOutcome};
