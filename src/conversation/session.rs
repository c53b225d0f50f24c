//! Issues gateway calls for a [`Conversation`].
//!
//! Every submitted question is asked on its own task. Tasks never touch the
//! transcript: they send a [`Resolution`] back over a channel, and the owner of
//! the session applies it. The conversation thus keeps a single writer no
//! matter how many questions are in flight.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::{Conversation, PendingRequest, ReconcileTarget};
use crate::chat::MessageId;
use crate::gateway::{self, Answer, AnswerGateway};

/// The outcome of one gateway call, tagged with the request that caused it.
#[derive(Debug)]
pub(crate) struct Resolution {
    pub pending: PendingRequest,
    pub outcome: Result<Answer, gateway::Error>,
}

pub(crate) struct Session {
    conversation: Conversation,
    gateway: Arc<dyn AnswerGateway>,
    tx: mpsc::UnboundedSender<Resolution>,
    rx: mpsc::UnboundedReceiver<Resolution>,
    outstanding: usize,
}

impl Session {
    pub(crate) fn new(gateway: Arc<dyn AnswerGateway>, target: ReconcileTarget) -> Session {
        let (tx, rx) = mpsc::unbounded_channel();

        let conversation = Conversation::new(target);

        debug!(reconcile = %conversation.target(), "session created");

        Session {
            conversation,
            gateway,
            tx,
            rx,
            outstanding: 0,
        }
    }

    pub(crate) fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The number of questions whose answers have not been applied yet.
    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Submits `raw` and starts asking it in the background. Returns the id of
    /// the placeholder, or `None` if the input was blank.
    pub(crate) fn submit(&mut self, raw: &str) -> Option<MessageId> {
        self.conversation.set_input(raw);

        let pending = self.conversation.submit_input()?;
        let id = pending.id;

        self.dispatch(pending);

        Some(id)
    }

    fn dispatch(&mut self, pending: PendingRequest) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();

        self.outstanding += 1;

        debug!(placeholder = %pending.id, outstanding = self.outstanding, "dispatching question");

        tokio::spawn(async move {
            let outcome = gateway.ask(&pending.question).await;

            // The receiver lives as long as the session; once the session is
            // gone nobody is interested in the answer.
            let _ = tx.send(Resolution { pending, outcome });
        });
    }

    /// Waits for the next answer to arrive, in completion order. Returns
    /// `None` immediately when nothing is outstanding.
    pub(crate) async fn next_resolution(&mut self) -> Option<Resolution> {
        if self.outstanding == 0 {
            return None;
        }

        self.rx.recv().await
    }

    /// Returns an answer that has already arrived, without waiting.
    pub(crate) fn try_resolution(&mut self) -> Option<Resolution> {
        self.rx.try_recv().ok()
    }

    /// Applies an answer to the conversation. Returns the index of the
    /// message it replaced.
    pub(crate) fn apply(&mut self, resolution: Resolution) -> Option<usize> {
        self.outstanding = self.outstanding.saturating_sub(1);

        self.conversation
            .reconcile(&resolution.pending, resolution.outcome)
    }
}
