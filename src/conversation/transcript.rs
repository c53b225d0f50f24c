//! The ordered record of every message in the current session.
//!
//! A transcript only grows through [`Transcript::push_exchange`], which appends
//! a user message together with the bot placeholder answering it. The only
//! other mutation is replacing a bot slot once its answer is known.

use crate::chat::{Message, MessageId, Sender};

#[derive(Debug, Default)]
pub(crate) struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
    revision: u64,
}

impl Transcript {
    pub(crate) fn new() -> Transcript {
        Transcript::default()
    }

    fn allocate_id(&mut self) -> MessageId {
        self.next_id += 1;

        MessageId(self.next_id)
    }

    /// Appends a user message and its placeholder in a single step. Returns
    /// the identifiers of both, user first.
    pub(crate) fn push_exchange(&mut self, question: String) -> (MessageId, MessageId) {
        self.revision += 1;

        let user_id = self.allocate_id();
        let placeholder_id = self.allocate_id();

        self.messages
            .push(Message::user(user_id, question, self.revision));
        self.messages
            .push(Message::placeholder(placeholder_id, self.revision));

        (user_id, placeholder_id)
    }

    /// Overwrites the bot slot at `index`, keeping its identifier. Returns
    /// `None` if the index is out of range or the slot is a user message.
    fn replace_at(
        &mut self,
        index: usize,
        text: String,
        context: Option<Vec<String>>,
    ) -> Option<usize> {
        let slot = self.messages.get_mut(index)?;

        if slot.sender != Sender::Bot {
            return None;
        }

        self.revision += 1;

        slot.text = text;
        slot.context = context;
        slot.pending = false;
        slot.revision = self.revision;

        Some(index)
    }

    /// Replaces the still-pending bot message identified by `id`.
    pub(crate) fn replace(
        &mut self,
        id: MessageId,
        text: String,
        context: Option<Vec<String>>,
    ) -> Option<usize> {
        let index = self.position(id)?;

        if !self.messages[index].pending {
            return None;
        }

        self.replace_at(index, text, context)
    }

    /// Replaces whatever bot message currently sits at the end of the
    /// transcript, pending or not.
    pub(crate) fn replace_last(
        &mut self,
        text: String,
        context: Option<Vec<String>>,
    ) -> Option<usize> {
        let index = self.messages.len().checked_sub(1)?;

        self.replace_at(index, text, context)
    }

    pub(crate) fn position(&self, id: MessageId) -> Option<usize> {
        // Identifiers increase with position, so a binary search is enough.
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub(crate) fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// A counter bumped by every mutation.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Messages (with their index) that changed after `revision`.
    pub(crate) fn changed_since(&self, revision: u64) -> impl Iterator<Item = (usize, &Message)> {
        self.messages
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.revision > revision)
    }
}
