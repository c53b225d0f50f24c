//! An in-process gateway whose answers are released by the test driving it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{Answer, AnswerGateway, Error, ErrorKind};

pub(crate) type Outcome = Result<Answer, Error>;

/// Answers each question only once the test releases it.
pub(crate) struct GatedGateway {
    gates: Mutex<HashMap<String, oneshot::Receiver<Outcome>>>,
}

#[async_trait]
impl AnswerGateway for GatedGateway {
    async fn ask(&self, question: &str) -> Outcome {
        let gate = self.gates.lock().unwrap().remove(question);

        match gate {
            Some(gate) => gate.await.unwrap_or_else(|_| {
                Err(Error::from_source(
                    ErrorKind::UnspecifiedError,
                    "gate dropped".into(),
                ))
            }),
            None => panic!("unexpected question {:?}", question),
        }
    }
}

/// Builds a gateway expecting `questions`, plus the senders that release
/// their outcomes.
pub(crate) fn gated(questions: &[&str]) -> (Arc<GatedGateway>, HashMap<String, oneshot::Sender<Outcome>>) {
    let mut gates = HashMap::new();
    let mut senders = HashMap::new();

    for q in questions {
        let (tx, rx) = oneshot::channel();
        gates.insert(q.to_string(), rx);
        senders.insert(q.to_string(), tx);
    }

    let gateway = GatedGateway {
        gates: Mutex::new(gates),
    };

    (Arc::new(gateway), senders)
}

pub(crate) fn answer(text: &str) -> Outcome {
    Ok(Answer {
        text: text.to_string(),
        context: None,
    })
}

pub(crate) fn failure() -> Outcome {
    Err(Error::from_source(ErrorKind::Connection, "refused".into()))
}
