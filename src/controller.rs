//! Chat panel controller
//!
//! Owns no surface and no globals: the host constructs it with a backend and
//! hands it the surface for each operation. Every operation that waits on the
//! network is split into a synchronous start and a synchronous completion so
//! an event loop can run the request in the background and feed the result
//! back in whenever it arrives.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ChatBackend, ChatOutcome, ChatReply};
use crate::error::ClientError;
use crate::markup::MarkupPolicy;
use crate::state::{Message, Role};
use crate::view::{Block, BlockId, BlockKind, ChatView};

pub const THINKING: &str = "Thinking…";
pub const CONNECTION_ERROR: &str = "Connection Error.";

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    pub markup: MarkupPolicy,
    /// Refuse new sends while one is pending.
    pub single_flight: bool,
}

/// A send whose reply hasn't been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub placeholder: BlockId,
    pub text: String,
}

pub struct ChatController<B: ChatBackend + ?Sized> {
    backend: Arc<B>,
    options: ControllerOptions,
    in_flight: usize,
}

fn block_kind(role: Role) -> BlockKind {
    match role {
        Role::User => BlockKind::User,
        Role::Assistant => BlockKind::Bot,
    }
}

impl<B: ChatBackend + ?Sized> ChatController<B> {
    pub fn new(backend: Arc<B>, options: ControllerOptions) -> Self {
        Self {
            backend,
            options,
            in_flight: 0,
        }
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Sends started but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fetch history and render it.
    pub async fn load_history<V: ChatView + ?Sized>(&mut self, view: &mut V) {
        let result = self.backend.history().await;
        self.apply_history(view, result);
    }

    /// Render a fetched history. Failures are logged and leave the view as it was.
    pub fn apply_history<V: ChatView + ?Sized>(
        &mut self,
        view: &mut V,
        result: Result<Vec<Message>, ClientError>,
    ) {
        let history = match result {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "could not load history");
                return;
            }
        };

        info!(messages = history.len(), "history loaded");
        if history.is_empty() {
            return;
        }

        view.clear();
        for msg in &history {
            let markup = self.options.markup.content(&msg.content);
            view.append(Block::markup(block_kind(msg.role), markup));
        }
        view.scroll_to_bottom();
    }

    /// Send the current input and apply the reply.
    pub async fn send_message<V: ChatView + ?Sized>(&mut self, view: &mut V) {
        if let Some(pending) = self.begin_send(view) {
            let result = self.backend.chat(&pending.text).await;
            self.finish_send(view, pending, result);
        }
    }

    /// Show the user's message and the placeholder. Returns the text to post,
    /// or `None` if nothing should be sent.
    pub fn begin_send<V: ChatView + ?Sized>(&mut self, view: &mut V) -> Option<PendingSend> {
        let text = view.input_value().trim().to_string();
        if text.is_empty() {
            return None;
        }
        if self.options.single_flight && self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "send refused while a reply is pending");
            return None;
        }

        view.append(Block::markup(BlockKind::User, self.options.markup.apply(&text)));
        view.clear_input();
        view.scroll_to_bottom();

        let placeholder = view.append(Block::text(BlockKind::Bot, THINKING));
        view.scroll_to_bottom();

        self.in_flight += 1;
        debug!(chars = text.chars().count(), "sending message");
        Some(PendingSend { placeholder, text })
    }

    /// Replace a send's placeholder with its reply, an error, or a connection error.
    pub fn finish_send<V: ChatView + ?Sized>(
        &mut self,
        view: &mut V,
        pending: PendingSend,
        result: Result<ChatReply, ClientError>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);
        view.remove(pending.placeholder);

        match result.and_then(ChatReply::into_outcome) {
            Ok(ChatOutcome::Answer(text)) => {
                view.append(Block::markup(BlockKind::Bot, self.options.markup.content(&text)));
            }
            Ok(ChatOutcome::AppError(error)) => {
                info!(%error, "backend reported an error");
                view.append(Block::error(format!(
                    "Error: {}",
                    self.options.markup.apply(&error)
                )));
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                view.append(Block::error(CONNECTION_ERROR));
            }
        }
        view.scroll_to_bottom();
    }
}
