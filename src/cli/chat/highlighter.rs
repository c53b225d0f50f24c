use crate::color::{self, color_mode};
use crate::cli::ColorMode;

/// Styles the line being typed. A leading `/` marks a command and is shown
/// in the prompt colour.
#[derive(Default)]
pub(crate) struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> reedline::StyledText {
        let style = match (color_mode(), line.starts_with('/')) {
            (ColorMode::Off, _) => nu_ansi_term::Style::default(),
            (ColorMode::On, true) => *color::USER_PROMPT,
            (ColorMode::On, false) => *color::USER_TEXT,
        };

        reedline::StyledText {
            buffer: vec![(style, line.to_string())],
        }
    }
}
