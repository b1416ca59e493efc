//! Message markup: building it for insertion and interpreting it for display.
//!
//! Content goes into the panel as a small HTML fragment (newlines become
//! `<br>`). Whether the text is entity-escaped first is the [`MarkupPolicy`].
//! The terminal surface then reads that fragment back with [`parse_lines`].

use serde::{Deserialize, Serialize};

/// How message text is turned into panel markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupPolicy {
    /// Insert text as-is. Any HTML in a message is interpreted by the surface,
    /// so the backend (and the user's own input) is trusted.
    Raw,
    /// Entity-escape text before inserting; embedded HTML is shown literally.
    #[default]
    Escaped,
}

impl MarkupPolicy {
    /// Apply the policy to text without touching newlines.
    pub fn apply(&self, text: &str) -> String {
        match self {
            MarkupPolicy::Raw => text.to_string(),
            MarkupPolicy::Escaped => escape_html(text),
        }
    }

    /// Apply the policy and convert newlines to `<br>`.
    pub fn content(&self, text: &str) -> String {
        newlines_to_br(&self.apply(text))
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn newlines_to_br(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Styling carried by a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: SegmentStyle,
}

#[derive(Default)]
struct Depth {
    bold: usize,
    italic: usize,
    code: usize,
}

impl Depth {
    fn style(&self) -> SegmentStyle {
        SegmentStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: self.code > 0,
        }
    }
}

struct LineBuilder {
    lines: Vec<Vec<Segment>>,
    current: Vec<Segment>,
    text: String,
    style: SegmentStyle,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            text: String::new(),
            style: SegmentStyle::default(),
        }
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.current.push(Segment {
                text: std::mem::take(&mut self.text),
                style: self.style,
            });
        }
    }

    fn set_style(&mut self, style: SegmentStyle) {
        if style != self.style {
            self.flush();
            self.style = style;
        }
    }

    fn push_char(&mut self, c: char) {
        self.text.push(c);
    }

    fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    fn break_line(&mut self) {
        self.flush();
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn finish(mut self) -> Vec<Vec<Segment>> {
        self.break_line();
        self.lines
    }
}

fn opens_tag(rest: &str) -> bool {
    rest[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Interpret panel markup into styled lines.
///
/// `<br>` breaks the line, `<b>`/`<strong>`, `<i>`/`<em>` and `<code>` style
/// the text inside them, any other tag is dropped. Entities are decoded.
/// A `<` is text unless a letter, `/` or `!` follows it and a `>` closes it.
pub fn parse_lines(markup: &str) -> Vec<Vec<Segment>> {
    let mut out = LineBuilder::new();
    let mut depth = Depth::default();
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' if opens_tag(rest) => {
                if let Some(end) = rest.find('>') {
                    let tag = &rest[1..end];
                    rest = &rest[end + 1..];
                    apply_tag(tag, &mut depth, &mut out);
                    continue;
                }
                out.push_char('<');
            }
            '&' => {
                if let Some((decoded, len)) = decode_entity(rest) {
                    out.push_str(&decoded);
                    rest = &rest[len..];
                    continue;
                }
                out.push_char('&');
            }
            '\n' => out.break_line(),
            _ => out.push_char(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    out.finish()
}

/// Markup reduced to plain text, one `\n` per line break.
pub fn plain_text(markup: &str) -> String {
    parse_lines(markup)
        .iter()
        .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn apply_tag(tag: &str, depth: &mut Depth, out: &mut LineBuilder) {
    let tag = tag.trim();
    let closing = tag.starts_with('/');
    let name: String = tag
        .trim_start_matches('/')
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let counter = match name.as_str() {
        "br" => {
            out.break_line();
            return;
        }
        "b" | "strong" => &mut depth.bold,
        "i" | "em" => &mut depth.italic,
        "code" => &mut depth.code,
        _ => return,
    };

    if closing {
        *counter = counter.saturating_sub(1);
    } else {
        *counter += 1;
    }
    out.set_style(depth.style());
}

/// Decode an entity at the start of `s`, returning the text and bytes consumed.
fn decode_entity(s: &str) -> Option<(String, usize)> {
    let end = s.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let name = &s[1..end];
    let decoded = match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => " ".to_string(),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?.to_string()
        }
    };
    Some((decoded, end + 1))
}
