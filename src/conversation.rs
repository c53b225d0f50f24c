//! Client-side conversation state.
//!
//! The [`Conversation`] owns the [`Transcript`] and is its only writer. A
//! submission appends the user's message together with a placeholder answer
//! and hands back a [`PendingRequest`]; once the gateway has replied (or
//! failed) the outcome is written back with [`Conversation::reconcile`].
//!
//! Which slot an outcome lands in is controlled by [`ReconcileTarget`]. The
//! default, [`ReconcileTarget::Origin`], writes into the placeholder created
//! for that very question. [`ReconcileTarget::Last`] instead overwrites
//! whatever message is last when the reply arrives; with several questions
//! in flight this lets an early reply clobber a later question's slot.

mod session;
mod transcript;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chat::{Message, MessageId, CONNECTION_ERROR_TEXT};
use crate::gateway::{self, Answer};

pub(crate) use session::{Resolution, Session};
pub(crate) use transcript::Transcript;

/// Selects the transcript slot that receives a resolved answer.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ReconcileTarget {
    /// The placeholder created when the question was submitted.
    #[default]
    Origin,
    /// The last message at the time the answer arrives.
    Last,
}

/// An outstanding question, correlated with its placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingRequest {
    /// The placeholder answering this question.
    pub id: MessageId,
    /// The trimmed question as submitted.
    pub question: String,
}

#[derive(Debug, Default)]
pub(crate) struct Conversation {
    transcript: Transcript,
    input: String,
    target: ReconcileTarget,
}

impl Conversation {
    pub(crate) fn new(target: ReconcileTarget) -> Conversation {
        Conversation {
            transcript: Transcript::new(),
            input: String::new(),
            target,
        }
    }

    pub(crate) fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn target(&self) -> ReconcileTarget {
        self.target
    }

    /// The text typed so far but not yet submitted.
    #[cfg(test)]
    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_input(&mut self, input: &str) {
        self.input.clear();
        self.input.push_str(input);
    }

    /// Submits the contents of the input buffer.
    pub(crate) fn submit_input(&mut self) -> Option<PendingRequest> {
        let raw = std::mem::take(&mut self.input);

        self.submit(&raw)
    }

    /// Appends the question and its placeholder. Whitespace-only input is
    /// ignored. The input buffer is cleared before the caller issues the
    /// request, and the returned request carries the question to ask.
    pub(crate) fn submit(&mut self, raw: &str) -> Option<PendingRequest> {
        let question = raw.trim();

        if question.is_empty() {
            return None;
        }

        let question = question.to_string();

        let (_, id) = self.transcript.push_exchange(question.clone());
        self.input.clear();

        debug!(placeholder = %id, "submitted question");

        Some(PendingRequest { id, question })
    }

    /// Writes the outcome of `pending` into the transcript and returns the
    /// index of the replaced message. Returns `None` when there is no slot to
    /// write to, e.g. when the placeholder was already resolved.
    pub(crate) fn reconcile(
        &mut self,
        pending: &PendingRequest,
        outcome: Result<Answer, gateway::Error>,
    ) -> Option<usize> {
        let (text, context) = match outcome {
            Ok(Answer { text, context }) => (text, context),
            Err(err) => {
                warn!(placeholder = %pending.id, error = %err, kind = ?err.kind(), "question failed");

                (CONNECTION_ERROR_TEXT.to_string(), None)
            }
        };

        let replaced = match self.target {
            ReconcileTarget::Origin => self.transcript.replace(pending.id, text, context),
            ReconcileTarget::Last => self.transcript.replace_last(text, context),
        };

        match replaced {
            Some(index) => debug!(placeholder = %pending.id, index, "reconciled"),
            None => warn!(placeholder = %pending.id, "no slot left for the answer, dropping it"),
        }

        replaced
    }

    pub(crate) fn last(&self) -> Option<&Message> {
        self.transcript.last()
    }
}
