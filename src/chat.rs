//! Type definitions for chat primitives
//!

use std::fmt;

/// The text shown in a bot slot while its answer is outstanding.
pub(crate) const PLACEHOLDER_TEXT: &str = "Thinking...";

/// The text shown in place of an answer when the gateway could not be reached
/// or replied with something that could not be understood.
pub(crate) const CONNECTION_ERROR_TEXT: &str =
    "Sorry, there was an error connecting to the server.";

/// The author of a `Message`
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Sender {
    /// A message typed by the user. It is always shown verbatim.
    User,

    /// A message produced on behalf of the answering service. Its text may
    /// contain markdown and it may carry a list of sources.
    Bot,
}

/// Identifies a message for the lifetime of a transcript. Identifiers are
/// assigned in creation order and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MessageId(pub(crate) u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A `Message` in a chat transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    pub id: MessageId,
    /// The author of the message
    pub sender: Sender,
    /// The contents of the message
    pub text: String,
    /// Citation sources attached to a bot answer
    pub context: Option<Vec<String>>,
    /// Set while the message is a placeholder awaiting its answer
    pub pending: bool,
    /// Transcript revision at which this slot last changed
    pub revision: u64,
}

impl Message {
    pub(crate) fn user(id: MessageId, text: String, revision: u64) -> Message {
        Message {
            id,
            sender: Sender::User,
            text,
            context: None,
            pending: false,
            revision,
        }
    }

    pub(crate) fn placeholder(id: MessageId, revision: u64) -> Message {
        Message {
            id,
            sender: Sender::Bot,
            text: PLACEHOLDER_TEXT.to_string(),
            context: None,
            pending: true,
            revision,
        }
    }

    /// Returns the citation sources worth showing. Absent and empty lists are
    /// treated alike.
    pub(crate) fn sources(&self) -> &[String] {
        match (&self.sender, &self.context) {
            (Sender::Bot, Some(context)) => context.as_slice(),
            _ => &[],
        }
    }
}
