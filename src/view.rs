//! The rendering surface the controller draws into.
//!
//! [`ChatView`] is the handful of page operations the controller needs.
//! [`PanelView`] is the in-memory implementation shared by the terminal UI
//! and the one-shot CLI commands.

use crate::markup::{self, escape_html};

/// Handle to a block in a surface, valid until the block is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    User,
    Bot,
}

impl BlockKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            BlockKind::User => "user-message",
            BlockKind::Bot => "bot-message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Error,
}

/// Block contents: markup is interpreted by the surface, text is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Markup(String),
    Text(String),
}

/// One entry in the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub tone: Tone,
    pub body: Body,
}

impl Block {
    pub fn markup(kind: BlockKind, markup: impl Into<String>) -> Self {
        Self {
            kind,
            tone: Tone::Normal,
            body: Body::Markup(markup.into()),
        }
    }

    pub fn text(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            tone: Tone::Normal,
            body: Body::Text(text.into()),
        }
    }

    /// A bot block styled to signal an error.
    pub fn error(markup: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Bot,
            tone: Tone::Error,
            body: Body::Markup(markup.into()),
        }
    }

    /// The block as an HTML `<div>` for the web chat page.
    pub fn to_html(&self) -> String {
        let inner = match &self.body {
            Body::Markup(m) => m.clone(),
            Body::Text(t) => escape_html(t),
        };
        let style = match self.tone {
            Tone::Normal => "",
            Tone::Error => " style=\"color:red\"",
        };
        format!(
            "<div class=\"message {}\"{}>{}</div>",
            self.kind.css_class(),
            style,
            inner
        )
    }

    /// What a reader sees, with line breaks as `\n`.
    pub fn display_text(&self) -> String {
        match &self.body {
            Body::Markup(m) => markup::plain_text(m),
            Body::Text(t) => t.clone(),
        }
    }
}

/// The page operations the chat controller performs.
pub trait ChatView {
    /// Current contents of the message input.
    fn input_value(&self) -> String;
    fn clear_input(&mut self);
    fn append(&mut self, block: Block) -> BlockId;
    /// Remove a block; returns false if it was already gone.
    fn remove(&mut self, id: BlockId) -> bool;
    /// Remove every block.
    fn clear(&mut self);
    fn scroll_to_bottom(&mut self);
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

/// Rows a line of text takes when wrapped at word boundaries.
fn wrapped_rows(line: &str, width: usize) -> usize {
    let mut rows = 1;
    let mut col = 0;
    for word in line.split(' ') {
        let len = word.chars().count();
        let need = if col == 0 { len } else { len + 1 };
        if col + need <= width {
            col += need;
            continue;
        }
        if col > 0 {
            rows += 1;
        }
        // Words wider than the panel are broken across rows
        col = len;
        while col > width {
            rows += 1;
            col -= width;
        }
    }
    rows
}

/// Headless message panel.
///
/// Scrolling is measured in wrapped lines of the current viewport. Once
/// [`scroll_to_bottom`](ChatView::scroll_to_bottom) is called the panel stays
/// pinned to the bottom across appends and resizes until scrolled manually.
///
/// Without a renderer the content height is estimated by word-wrapping each
/// block. A renderer that knows the exact height reports it with
/// [`set_content_lines`](PanelView::set_content_lines).
#[derive(Debug, Clone)]
pub struct PanelView {
    blocks: Vec<(BlockId, Block)>,
    next_id: u64,
    pub input: InputLine,
    scroll: usize,
    pinned: bool,
    width: u16,
    height: u16,
    // Height reported by the renderer for the current blocks and width
    measured: Option<usize>,
}

impl Default for PanelView {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelView {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 0,
            input: InputLine::default(),
            scroll: 0,
            pinned: false,
            width: 0,
            height: 0,
            measured: None,
        }
    }

    /// A panel showing a welcome block until history replaces it.
    pub fn with_welcome(text: &str) -> Self {
        let mut view = Self::new();
        view.append(Block::text(BlockKind::Bot, text));
        view
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().map(|(_, b)| b)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|(i, _)| *i == id).map(|(_, b)| b)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The whole panel as the page's HTML.
    pub fn to_html(&self) -> String {
        self.blocks().map(Block::to_html).collect::<Vec<_>>().join("\n")
    }

    /// Update the viewport (inner width and height of the panel).
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        if self.width == width && self.height == height {
            return;
        }
        if self.width != width {
            self.measured = None;
        }
        self.width = width;
        self.height = height;
        self.follow();
    }

    /// Record the exact rendered height of all blocks at the current width.
    ///
    /// Holds until the blocks or the width change.
    pub fn set_content_lines(&mut self, lines: usize) {
        if self.measured == Some(lines) {
            return;
        }
        self.measured = Some(lines);
        self.follow();
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    fn wrap_width(&self) -> usize {
        if self.width > 0 {
            self.width as usize
        } else {
            50
        }
    }

    fn visible_height(&self) -> usize {
        if self.height > 0 {
            self.height as usize
        } else {
            20
        }
    }

    /// Estimated lines for one block: a role line, its content, a blank line.
    pub fn block_lines(&self, block: &Block) -> usize {
        let wrap_width = self.wrap_width();
        let content: usize = block
            .display_text()
            .split('\n')
            .map(|line| wrapped_rows(line, wrap_width))
            .sum();
        content + 2
    }

    pub fn total_lines(&self) -> usize {
        match self.measured {
            Some(lines) => lines,
            None => self.blocks().map(|b| self.block_lines(b)).sum(),
        }
    }

    pub fn max_scroll(&self) -> usize {
        self.total_lines().saturating_sub(self.visible_height())
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
        self.pinned = self.scroll == self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.pinned = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.pinned = false;
    }

    pub fn half_page(&self) -> usize {
        (self.visible_height() / 2).max(1)
    }

    fn follow(&mut self) {
        if self.pinned {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn content_changed(&mut self) {
        self.measured = None;
        self.follow();
    }
}

impl ChatView for PanelView {
    fn input_value(&self) -> String {
        self.input.text().to_string()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn append(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push((id, block));
        self.content_changed();
        id
    }

    fn remove(&mut self, id: BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|(i, _)| *i != id);
        let removed = self.blocks.len() != before;
        if removed {
            self.content_changed();
        }
        removed
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.measured = None;
        self.scroll = 0;
    }

    fn scroll_to_bottom(&mut self) {
        self.pinned = true;
        self.scroll = self.max_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> PanelView {
        let mut view = PanelView::new();
        view.set_viewport(40, 10);
        for i in 0..n {
            view.append(Block::markup(BlockKind::User, format!("message {}", i)));
        }
        view
    }

    #[test]
    fn test_block_html() {
        let block = Block::markup(BlockKind::User, "Hello");
        assert_eq!(block.to_html(), "<div class=\"message user-message\">Hello</div>");

        let err = Block::error("Connection Error.");
        assert_eq!(
            err.to_html(),
            "<div class=\"message bot-message\" style=\"color:red\">Connection Error.</div>"
        );
    }

    #[test]
    fn test_text_body_is_escaped_in_html() {
        let block = Block::text(BlockKind::Bot, "<i>Thinking…</i>");
        assert_eq!(
            block.to_html(),
            "<div class=\"message bot-message\">&lt;i&gt;Thinking…&lt;/i&gt;</div>"
        );
    }

    #[test]
    fn test_ids_are_stable_across_removal() {
        let mut view = PanelView::new();
        let a = view.append(Block::text(BlockKind::User, "a"));
        let b = view.append(Block::text(BlockKind::Bot, "b"));
        let c = view.append(Block::text(BlockKind::User, "c"));

        assert!(view.remove(b));
        assert!(!view.remove(b));
        assert_eq!(view.block(a).map(Block::display_text), Some("a".to_string()));
        assert_eq!(view.block(c).map(Block::display_text), Some("c".to_string()));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_block_lines_wraps_by_chars() {
        let mut view = PanelView::new();
        view.set_viewport(10, 5);
        // role line + 2 wrapped lines + 1 line + blank
        let block = Block::markup(BlockKind::Bot, "ñññññññññññ<br>x");
        assert_eq!(view.block_lines(&block), 5);
    }

    #[test]
    fn test_block_lines_wraps_at_words() {
        let mut view = PanelView::new();
        view.set_viewport(10, 5);
        // "aaaaaa" / "bbbbbbb" / "ccc" rather than 18 chars over two rows
        let block = Block::markup(BlockKind::Bot, "aaaaaa bbbbbbb ccc");
        assert_eq!(view.block_lines(&block), 5);
    }

    #[test]
    fn test_rendered_height_overrides_estimate() {
        let mut view = filled(10);
        view.scroll_to_bottom();
        let estimate = view.total_lines();

        view.set_content_lines(estimate + 7);
        assert_eq!(view.total_lines(), estimate + 7);
        assert_eq!(view.scroll(), view.max_scroll());

        // New content drops the measurement until the next render
        view.append(Block::markup(BlockKind::Bot, "more"));
        let estimate: usize = view.blocks().map(|b| view.block_lines(b)).sum();
        assert_eq!(view.total_lines(), estimate);
        assert_eq!(view.scroll(), view.max_scroll());
    }

    #[test]
    fn test_bottom_reachable_past_u16_lines() {
        let mut view = PanelView::new();
        view.set_viewport(40, 10);
        view.append(Block::text(BlockKind::Bot, "x\n".repeat(70_000)));
        view.scroll_to_bottom();
        assert_eq!(view.total_lines(), 70_003);
        assert_eq!(view.scroll(), 69_993);

        view.set_content_lines(100_000);
        assert_eq!(view.scroll(), 99_990);
    }

    #[test]
    fn test_scroll_to_bottom_reaches_max() {
        let mut view = filled(10);
        assert!(view.max_scroll() > 0);
        view.scroll_to_bottom();
        assert_eq!(view.scroll(), view.max_scroll());
    }

    #[test]
    fn test_pinned_view_follows_appends_and_resizes() {
        let mut view = filled(10);
        view.scroll_to_bottom();
        view.append(Block::markup(BlockKind::Bot, "one more"));
        assert_eq!(view.scroll(), view.max_scroll());

        view.set_viewport(20, 4);
        assert_eq!(view.scroll(), view.max_scroll());
    }

    #[test]
    fn test_manual_scroll_unpins() {
        let mut view = filled(10);
        view.scroll_to_bottom();
        view.scroll_up(3);
        assert!(!view.is_pinned());
        let at = view.scroll();
        view.append(Block::markup(BlockKind::Bot, "new"));
        assert_eq!(view.scroll(), at);

        view.scroll_down(usize::MAX);
        assert!(view.is_pinned());
    }

    #[test]
    fn test_clear_resets_scroll() {
        let mut view = filled(10);
        view.scroll_to_bottom();
        view.clear();
        assert!(view.is_empty());
        assert_eq!(view.scroll(), 0);
    }

    #[test]
    fn test_input_line_utf8_editing() {
        let mut input = InputLine::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text(), "hélo");
        input.home();
        input.delete();
        assert_eq!(input.text(), "élo");
        input.end();
        input.insert('!');
        assert_eq!(input.text(), "élo!");
        assert_eq!(input.cursor(), 4);
    }
}
