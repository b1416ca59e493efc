use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use chat_panel::markup::{self, Segment};
use chat_panel::{Block as ChatBlock, BlockKind, Body, Tone};
use crate::app::{App, InputMode};

/// Style for a run of interpreted markup
fn segment_style(segment: &Segment, base: Style) -> Style {
    let mut style = base;
    if segment.style.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if segment.style.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if segment.style.code {
        style = style.fg(Color::Green);
    }
    style
}

/// Lines for one message: a role label, the body, and a blank separator
fn block_lines(block: &ChatBlock) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let label = match block.kind {
        BlockKind::User => Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        BlockKind::Bot => Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(label));

    let base = match block.tone {
        Tone::Normal => Style::default(),
        Tone::Error => Style::default().fg(Color::Red),
    };

    match &block.body {
        Body::Markup(m) => {
            for segments in markup::parse_lines(m) {
                let spans: Vec<Span<'static>> = segments
                    .iter()
                    .map(|s| Span::styled(s.text.clone(), segment_style(s, base)))
                    .collect();
                lines.push(Line::from(spans));
            }
        }
        // Plain-text bodies are transient notices such as the placeholder
        Body::Text(t) => {
            for line in t.split('\n') {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    base.fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    // Inner size minus borders drives the panel's scroll math
    let inner_width = area.width.saturating_sub(2);
    app.panel
        .set_viewport(inner_width, area.height.saturating_sub(2));

    let lines: Vec<Line> = app.panel.blocks().flat_map(block_lines).collect();
    let text = Text::from(lines);

    // Measure with the same wrapping the panel is drawn with
    let rendered = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(inner_width);
    app.panel.set_content_lines(rendered);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let title = match app.pending_replies() {
        0 => " Messages ".to_string(),
        n => format!(" Messages ({} waiting) ", n),
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let scroll = u16::try_from(app.panel.scroll()).unwrap_or(u16::MAX);
    let chat = Paragraph::new(text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.panel.input.cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .panel
        .input
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style, hints) = match app.input_mode {
        InputMode::Normal => (
            " SCROLL ",
            Style::default().bg(Color::Blue).fg(Color::White),
            " j/k scroll  g/G top/bottom  i type  q quit",
        ),
        InputMode::Editing => (
            " INPUT ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
            " Enter send  Esc scroll  PgUp/PgDn scroll  Ctrl-C quit",
        ),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}
