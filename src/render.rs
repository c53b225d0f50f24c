//! Maps transcript messages to a display structure.
//!
//! [`render`] is pure: the same message always yields the same
//! [`RenderedMessage`]. How that structure is painted is up to the caller; the
//! terminal painter lives in [`terminal`].

pub(crate) mod markdown;
pub(crate) mod terminal;

use crate::chat::{Message, Sender};

/// Shown in place of the transcript before anything has been sent.
pub(crate) const EMPTY_PROMPT: &str = "Start the conversation below…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
}

/// The avatar drawn next to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Glyph {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    /// Text shown exactly as written, without markup interpretation.
    Verbatim(String),
    Paragraph(Vec<Inline>),
    /// An unordered list; each entry is one item.
    List(Vec<Vec<Inline>>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedMessage {
    pub sender: Sender,
    pub align: Align,
    pub glyph: Glyph,
    pub body: Vec<Block>,
    /// Citation sources, in order, never shortened.
    pub sources: Vec<String>,
}

pub(crate) fn render(msg: &Message) -> RenderedMessage {
    match msg.sender {
        Sender::User => RenderedMessage {
            sender: Sender::User,
            align: Align::Right,
            glyph: Glyph::User,
            body: vec![Block::Verbatim(msg.text.clone())],
            sources: Vec::new(),
        },
        Sender::Bot => RenderedMessage {
            sender: Sender::Bot,
            align: Align::Left,
            glyph: Glyph::Bot,
            body: markdown::parse(&msg.text),
            sources: msg
                .sources()
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageId;

    fn bot(text: &str, context: Option<Vec<&str>>) -> Message {
        Message {
            id: MessageId(2),
            sender: Sender::Bot,
            text: text.to_string(),
            context: context.map(|c| c.into_iter().map(String::from).collect()),
            pending: false,
            revision: 1,
        }
    }

    #[test]
    fn test_user_text_is_verbatim() {
        let msg = Message::user(MessageId(1), "what is **GDP**?".to_string(), 1);

        let rendered = render(&msg);

        assert_eq!(rendered.align, Align::Right);
        assert_eq!(rendered.glyph, Glyph::User);
        assert_eq!(
            rendered.body,
            vec![Block::Verbatim("what is **GDP**?".to_string())]
        );
        assert!(rendered.sources.is_empty());
    }

    #[test]
    fn test_bot_text_is_markdown() {
        let rendered = render(&bot("**A**", Some(vec!["S1", "S2"])));

        assert_eq!(rendered.align, Align::Left);
        assert_eq!(
            rendered.body,
            vec![Block::Paragraph(vec![Inline::Strong(vec![Inline::Text(
                "A".to_string()
            )])])]
        );
        assert_eq!(rendered.sources, vec!["S1", "S2"]);
    }

    #[test]
    fn test_no_sources_block_without_context() {
        assert!(render(&bot("A", None)).sources.is_empty());
        assert!(render(&bot("A", Some(vec![]))).sources.is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let msg = bot(
            "Intro\n\n- *one*\n- two\n\n---\n\n| a | b |",
            Some(vec!["https://datasaudi.sa/en/indicator/population"]),
        );

        assert_eq!(render(&msg), render(&msg));
    }

    #[test]
    fn test_unsupported_markdown_keeps_surrounding_text() {
        let rendered = render(&bot(
            "Before the table.\n\n| Region | Pop |\n|---|---|\n| Riyadh | 8.6M |\n\nAfter the table.",
            None,
        ));

        assert_eq!(rendered.body.len(), 3);
        assert_eq!(
            rendered.body[0],
            Block::Paragraph(vec![Inline::Text("Before the table.".to_string())])
        );
        assert_eq!(
            rendered.body[2],
            Block::Paragraph(vec![Inline::Text("After the table.".to_string())])
        );
    }
}
