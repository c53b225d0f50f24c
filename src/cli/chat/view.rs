//! Keeps the terminal in step with the transcript.
//!
//! The view remembers the transcript revision it last painted and, on each
//! refresh, paints only the messages that changed since then. New output is
//! always written at the bottom, so the newest message is the one in view;
//! the scroll target is tracked explicitly as well. Output is append-only:
//! an answered placeholder stays in the scrollback and its answer follows.

use crate::chat::Sender;
use crate::conversation::Transcript;
use crate::render::render;
use crate::render::terminal::Painter;

pub(crate) struct TranscriptView {
    painter: Painter,
    seen_revision: u64,
    scroll_target: Option<usize>,
    shown_empty: bool,
    /// Whether user messages are painted. In the REPL the line editor has
    /// already shown what the user typed.
    echo_user: bool,
}

impl TranscriptView {
    pub(crate) fn new(painter: Painter, echo_user: bool) -> TranscriptView {
        TranscriptView {
            painter,
            seen_revision: 0,
            scroll_target: None,
            shown_empty: false,
            echo_user,
        }
    }

    /// The index of the message that should be in view.
    pub(crate) fn scroll_target(&self) -> Option<usize> {
        self.scroll_target
    }

    pub(crate) fn painter(&self) -> &Painter {
        &self.painter
    }

    /// Returns the output that brings the terminal up to date with
    /// `transcript`. The result is empty when nothing changed.
    pub(crate) fn refresh(&mut self, transcript: &Transcript) -> String {
        let mut out = String::new();

        if transcript.is_empty() {
            if !self.shown_empty {
                out.push_str(&self.painter.paint_empty());
                out.push('\n');
                self.shown_empty = true;
            }

            return out;
        }

        let mut changed = false;

        for (index, msg) in transcript.changed_since(self.seen_revision) {
            changed = true;

            let rendered = render(msg);

            match msg.sender {
                Sender::User => {
                    if self.echo_user {
                        out.push_str(&self.painter.paint_message(&rendered, false));
                        out.push('\n');
                    }
                }
                Sender::Bot if msg.pending => {
                    out.push_str(&self.painter.paint_message(&rendered, true));
                    out.push('\n');
                }
                Sender::Bot => {
                    if index + 1 < transcript.len() {
                        // An answer to an earlier question; say which one.
                        if let Some(question) = index
                            .checked_sub(1)
                            .and_then(|i| transcript.get(i))
                            .filter(|m| m.sender == Sender::User)
                        {
                            out.push_str(&self.painter.paint_notice(&format!(
                                "answer to \"{}\":",
                                question.text
                            )));
                            out.push('\n');
                        }
                    }

                    out.push_str(&self.painter.paint_message(&rendered, false));
                    out.push_str("\n\n");
                }
            }
        }

        self.seen_revision = transcript.revision();

        if changed {
            self.scroll_target = Some(transcript.len() - 1);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ColorMode;

    fn view(echo_user: bool) -> TranscriptView {
        TranscriptView::new(Painter::new(40, ColorMode::Off), echo_user)
    }

    #[test]
    fn test_empty_transcript_shows_prompt_once() {
        let mut view = view(true);
        let transcript = Transcript::new();

        assert_eq!(view.refresh(&transcript), "Start the conversation below…\n");
        assert_eq!(view.refresh(&transcript), "");
        assert_eq!(view.scroll_target(), None);
    }

    #[test]
    fn test_scrolls_to_newest_message() {
        let mut view = view(true);
        let mut transcript = Transcript::new();

        let (_, first) = transcript.push_exchange("Q1".to_string());
        let out = view.refresh(&transcript);

        assert!(out.contains("Q1 [#]"));
        assert!(out.ends_with("[bot] Thinking...\n"));
        assert_eq!(view.scroll_target(), Some(1));

        transcript.push_exchange("Q2".to_string());
        view.refresh(&transcript);
        assert_eq!(view.scroll_target(), Some(3));

        transcript.replace(first, "A1".to_string(), None);
        view.refresh(&transcript);
        assert_eq!(view.scroll_target(), Some(3));

        assert_eq!(view.refresh(&transcript), "");
    }

    #[test]
    fn test_answer_follows_its_placeholder() {
        let mut view = view(false);
        let mut transcript = Transcript::new();

        let (_, id) = transcript.push_exchange("Q".to_string());
        assert_eq!(view.refresh(&transcript), "[bot] Thinking...\n");

        transcript.replace(id, "A".to_string(), Some(vec!["S".to_string()]));
        let out = view.refresh(&transcript);

        assert!(out.starts_with("[bot] A"));
        assert!(out.contains("• S"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_late_answer_names_its_question() {
        let mut view = view(false);
        let mut transcript = Transcript::new();

        let (_, first) = transcript.push_exchange("Q1".to_string());
        transcript.push_exchange("Q2".to_string());
        view.refresh(&transcript);

        transcript.replace(first, "A1".to_string(), None);
        let out = view.refresh(&transcript);

        assert_eq!(out, "answer to \"Q1\":\n[bot] A1\n\n");
    }
}
