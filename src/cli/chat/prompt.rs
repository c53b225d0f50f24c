use nu_ansi_term::AnsiGenericString;
use reedline::{PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, PromptViMode};
use std::borrow::Cow;

use crate::color::{self, MaybePaint};

const ASK_INDICATOR: &str = "[#] ";
const VI_NORMAL_INDICATOR: &str = "[=] ";
const CONTINUATION_INDICATOR: &str = "::: ";

/// The placeholder shown in an empty input line.
pub(crate) const INPUT_HINT: &str = "Type your question…";

fn indicator(text: &'static str) -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(text)
}

/// The indicator shown in front of a question, also used to echo questions
/// that did not come from the line editor.
pub(crate) fn user_prompt() -> AnsiGenericString<'static, str> {
    indicator(ASK_INDICATOR)
}

/// Indicators are painted once, when the prompt is built, since the colour
/// mode is fixed for the life of the process.
pub(crate) struct Prompt {
    ask: String,
    vi_normal: String,
    continuation: String,
}

impl Default for Prompt {
    fn default() -> Self {
        Prompt {
            ask: user_prompt().to_string(),
            vi_normal: indicator(VI_NORMAL_INDICATOR).to_string(),
            continuation: indicator(CONTINUATION_INDICATOR).to_string(),
        }
    }
}

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, prompt_mode: PromptEditMode) -> Cow<str> {
        match prompt_mode {
            PromptEditMode::Vi(PromptViMode::Normal) => Cow::Borrowed(&self.vi_normal),
            _ => Cow::Borrowed(&self.ask),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed(&self.continuation)
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let label = match history_search.status {
            PromptHistorySearchStatus::Passing => "earlier questions",
            PromptHistorySearchStatus::Failing => "no earlier question",
        };

        Cow::Owned(format!("({}: {}) ", label, history_search.term))
    }
}
