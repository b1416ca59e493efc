pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod markup;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use api::{ChatBackend, ChatOutcome, ChatReply, HttpChatClient};
pub use config::Config;
pub use controller::{ChatController, ControllerOptions, PendingSend};
pub use error::ClientError;
pub use markup::MarkupPolicy;
pub use state::{Message, Role};
pub use view::{Block, BlockId, BlockKind, Body, ChatView, PanelView, Tone};
