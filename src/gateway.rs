//! Traits and type definitions for talking to a question-answering service.
//!
//! The service is a black box reached through the [`AnswerGateway`] trait: it
//! takes a question and returns an [`Answer`], optionally with the sources the
//! answer was drawn from. [`HttpGateway`] implements the trait over the JSON
//! `POST /api/ask` contract.
//!
//! ## Error Handling
//!
//! The conversation does not distinguish between failures; every one of them
//! becomes the same apology in the transcript. The [`ErrorKind`] is still kept
//! so that failures can be told apart in logs and by the `health` command.

#[cfg(test)]
pub(crate) mod gated;
pub(crate) mod http;
mod reqwest_error;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;

pub(crate) use http::{Health, HttpGateway};

/// General categories of errors that can be returned by an [`AnswerGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    /// Failed to connect to the service. This could be due to network
    /// issues like DNS resolution, refused connections, or routing problems.
    Connection,
    /// The transport gave up waiting on the service.
    TimedOut,
    /// The configured API base or path does not form a usable URL.
    InvalidEndpoint,
    /// The service answered with a non-success HTTP status.
    Status,
    /// The response body could not be decoded or did not have the
    /// expected shape.
    UnexpectedResponse,
    /// An error that does not fit into any of the other categories.
    UnspecifiedError,
}

#[derive(Debug)]
pub(crate) struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub(crate) fn from_source(kind: ErrorKind, source: Box<dyn StdError + Send + Sync>) -> Error {
        Error {
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorKind::Connection => "failed to connect to the answering service",
            ErrorKind::TimedOut => "request timed out",
            ErrorKind::InvalidEndpoint => "the answering service endpoint is invalid",
            ErrorKind::Status => "the answering service returned an error status",
            ErrorKind::UnexpectedResponse => "the response was unexpected or malformed",
            ErrorKind::UnspecifiedError => "an unspecified error occurred",
        };

        f.write_str(message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| &**e as _)
    }
}

/// A resolved answer to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Answer {
    /// The answer itself, possibly formatted as markdown.
    pub text: String,
    /// Identifiers of the sources the answer cites, if any.
    pub context: Option<Vec<String>>,
}

/// A trait implemented by every question-answering backend.
#[async_trait]
pub(crate) trait AnswerGateway: Send + Sync {
    /// Asks a single question. Each call is independent; the service keeps no
    /// conversation state on our behalf.
    async fn ask(&self, question: &str) -> Result<Answer, Error>;
}
