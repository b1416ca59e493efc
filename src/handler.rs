use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::HistoryLoaded(result) => {
            app.controller.apply_history(&mut app.panel, result);
        }
        AppEvent::ChatResolved { pending, result } => {
            app.controller.finish_send(&mut app.panel, pending, result);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the input box
        KeyCode::Char('i') | KeyCode::Tab | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.panel.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.panel.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = app.panel.half_page();
            app.panel.scroll_down(half);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = app.panel.half_page();
            app.panel.scroll_up(half);
        }
        KeyCode::PageDown => {
            let half = app.panel.half_page();
            app.panel.scroll_down(half * 2);
        }
        KeyCode::PageUp => {
            let half = app.panel.half_page();
            app.panel.scroll_up(half * 2);
        }
        KeyCode::Char('g') | KeyCode::Home => app.panel.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.panel.scroll_down(usize::MAX),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.panel.input.backspace(),
        KeyCode::Delete => app.panel.input.delete(),
        KeyCode::Left => app.panel.input.left(),
        KeyCode::Right => app.panel.input.right(),
        KeyCode::Home => app.panel.input.home(),
        KeyCode::End => app.panel.input.end(),
        KeyCode::PageUp => {
            let half = app.panel.half_page();
            app.panel.scroll_up(half * 2);
        }
        KeyCode::PageDown => {
            let half = app.panel.half_page();
            app.panel.scroll_down(half * 2);
        }
        KeyCode::Char(c) => app.panel.input.insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.panel.scroll_down(3),
        MouseEventKind::ScrollUp => app.panel.scroll_up(3),
        _ => {}
    }
}
