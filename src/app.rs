use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use chat_panel::{ChatBackend, ChatController, ControllerOptions, PanelView};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub panel: PanelView,
    pub controller: ChatController<dyn ChatBackend>,
    pub base_url: String,

    // Where background requests post their results
    events: UnboundedSender<AppEvent>,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        options: ControllerOptions,
        base_url: String,
        welcome: &str,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            panel: PanelView::with_welcome(welcome),
            controller: ChatController::new(backend, options),
            base_url,
            events,
            chat_area: None,
        }
    }

    /// Kick off the one-time history load; the result comes back as an event.
    pub fn start_history_load(&self) {
        let backend = self.controller.backend();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = backend.history().await;
            let _ = tx.send(AppEvent::HistoryLoaded(result));
        });
    }

    /// Show the input as a message and post it in the background.
    pub fn submit(&mut self) {
        let Some(pending) = self.controller.begin_send(&mut self.panel) else {
            return;
        };

        debug!(placeholder = ?pending.placeholder, "chat request spawned");
        let backend = self.controller.backend();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = backend.chat(&pending.text).await;
            let _ = tx.send(AppEvent::ChatResolved { pending, result });
        });
    }

    pub fn pending_replies(&self) -> usize {
        self.controller.in_flight()
    }
}
