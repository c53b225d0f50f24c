//! Paints rendered messages as lines of (optionally) ANSI-styled text.

use std::borrow::Cow;

use nu_ansi_term::Style;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Align, Block, Glyph, Inline, RenderedMessage, EMPTY_PROMPT};
use crate::cli::ColorMode;
use crate::color::{self, paint_with};

const USER_GLYPH: &str = "[#]";
const BOT_GLYPH: &str = "[bot]";
const BULLET: &str = "• ";
const RULE_CHAR: char = '─';
const SOURCES_HEADER: &str = "Sources:";
const DEFAULT_WIDTH: usize = 80;
const MIN_WIDTH: usize = 20;

pub(crate) fn glyph_text(glyph: Glyph) -> &'static str {
    match glyph {
        Glyph::User => USER_GLYPH,
        Glyph::Bot => BOT_GLYPH,
    }
}

/// Shortens `text` to at most `max` display columns, marking the cut with `…`.
pub(crate) fn ellipsize(text: &str, max: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(text) <= max {
        return Cow::Borrowed(text);
    }

    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut short = String::new();

    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);

        if used + w > budget {
            break;
        }

        used += w;
        short.push(ch);
    }

    short.push('…');

    Cow::Owned(short)
}

/// Replaces control characters, escape sequences included, so text from the
/// server cannot drive the terminal. Tabs become spaces.
pub(crate) fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .map(|ch| match ch {
                '\t' => ' ',
                c if c.is_control() => '\u{fffd}',
                c => c,
            })
            .collect(),
    )
}

fn width_from(size: std::io::Result<(u16, u16)>, columns: Option<String>) -> usize {
    match size {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => columns
            .and_then(|c| c.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_WIDTH),
    }
}

/// The width of the terminal. Falls back to `COLUMNS`, then to 80 columns,
/// when there is no terminal to ask.
pub(crate) fn terminal_width() -> usize {
    width_from(crossterm::terminal::size(), std::env::var("COLUMNS").ok())
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Painter {
    width: usize,
    color: ColorMode,
}

impl Painter {
    pub(crate) fn new(width: usize, color: ColorMode) -> Painter {
        Painter {
            width: width.max(MIN_WIDTH),
            color,
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        paint_with(self.color, style, sanitize(text)).to_string()
    }

    fn paint_inline(&self, spans: &[Inline], style: Style, out: &mut String) {
        for span in spans {
            match span {
                Inline::Text(text) => out.push_str(&self.paint(style, text)),
                Inline::Strong(inner) => self.paint_inline(inner, style.bold(), out),
                Inline::Emphasis(inner) => self.paint_inline(inner, style.italic(), out),
            }
        }
    }

    fn inline_line(&self, spans: &[Inline]) -> String {
        let mut out = String::new();
        self.paint_inline(spans, *color::BOT_TEXT, &mut out);
        out
    }

    /// Paints the body and sources of a bot message, one entry per line,
    /// without the leading glyph.
    fn bot_lines(&self, msg: &RenderedMessage, indent: usize) -> Vec<String> {
        let inner_width = self.width.saturating_sub(indent).max(1);
        let mut lines = Vec::new();

        for (i, block) in msg.body.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }

            match block {
                Block::Verbatim(text) => {
                    lines.extend(text.lines().map(|l| self.paint(*color::BOT_TEXT, l)))
                }
                Block::Paragraph(spans) => lines.push(self.inline_line(spans)),
                Block::List(items) => {
                    for item in items {
                        lines.push(format!("{}{}", BULLET, self.inline_line(item)));
                    }
                }
                Block::Rule => {
                    let rule: String = std::iter::repeat(RULE_CHAR).take(inner_width).collect();
                    lines.push(self.paint(*color::RULE, &rule));
                }
            }
        }

        if !msg.sources.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }

            lines.push(self.paint(*color::SOURCES_HEADER, SOURCES_HEADER));

            let source_width = inner_width.saturating_sub(UnicodeWidthStr::width(BULLET)).max(1);

            for source in &msg.sources {
                let shown = ellipsize(source, source_width);
                lines.push(format!(
                    "{}{}",
                    BULLET,
                    self.paint(*color::SOURCE_TEXT, &shown)
                ));
            }
        }

        lines
    }

    fn paint_left(&self, msg: &RenderedMessage, pending: bool) -> String {
        let glyph = glyph_text(msg.glyph);
        let indent = UnicodeWidthStr::width(glyph) + 1;
        let pad = " ".repeat(indent);

        let lines = if pending {
            msg.body
                .iter()
                .filter_map(|b| match b {
                    Block::Paragraph(spans) => Some(spans),
                    _ => None,
                })
                .map(|spans| {
                    let mut out = String::new();
                    self.paint_inline(spans, *color::PLACEHOLDER_TEXT, &mut out);
                    out
                })
                .collect()
        } else {
            self.bot_lines(msg, indent)
        };

        let mut out = self.paint(*color::BOT_PROMPT, glyph);

        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                out.push(' ');
            } else {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&pad);
                }
            }
            out.push_str(line);
        }

        out
    }

    fn paint_right(&self, msg: &RenderedMessage) -> String {
        let glyph = glyph_text(msg.glyph);
        let right_edge = self.width.saturating_sub(UnicodeWidthStr::width(glyph) + 1);

        let text: Vec<&str> = msg
            .body
            .iter()
            .flat_map(|b| match b {
                Block::Verbatim(text) => text.lines().collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect();

        let mut out = String::new();

        for (i, line) in text.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }

            let len = UnicodeWidthStr::width(*line);
            out.push_str(&" ".repeat(right_edge.saturating_sub(len)));
            out.push_str(&self.paint(*color::USER_TEXT, line));

            if i == 0 {
                out.push(' ');
                out.push_str(&self.paint(*color::USER_PROMPT, glyph));
            }
        }

        out
    }

    /// Paints a message. Pending placeholders are drawn in a muted style.
    pub(crate) fn paint_message(&self, msg: &RenderedMessage, pending: bool) -> String {
        match msg.align {
            Align::Left => self.paint_left(msg, pending),
            Align::Right => self.paint_right(msg),
        }
    }

    pub(crate) fn paint_empty(&self) -> String {
        self.paint(*color::NOTICE_TEXT, EMPTY_PROMPT)
    }

    pub(crate) fn paint_notice(&self, text: &str) -> String {
        self.paint(*color::NOTICE_TEXT, text)
    }

    pub(crate) fn paint_banner(&self, text: &str) -> String {
        self.paint(*color::BANNER_TEXT, text)
    }
}
