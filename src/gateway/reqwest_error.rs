//! Classifies transport failures reported by reqwest.
//!
//! Status codes never reach this type: the gateway checks them itself and
//! reports [`gateway::ErrorKind::Status`] without consulting reqwest.

use std::error::Error as StdError;
use std::fmt;

use crate::gateway;

/// The point of the exchange at which the transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Send,
    ReadBody,
}

#[derive(Debug)]
pub(crate) struct Error {
    phase: Phase,
    kind: gateway::ErrorKind,
    source: reqwest::Error,
}

fn classify(err: &reqwest::Error) -> gateway::ErrorKind {
    if err.is_timeout() {
        gateway::ErrorKind::TimedOut
    } else if err.is_connect() {
        gateway::ErrorKind::Connection
    } else if err.is_decode() || err.is_redirect() || err.is_body() {
        gateway::ErrorKind::UnexpectedResponse
    } else if err.is_builder() {
        gateway::ErrorKind::InvalidEndpoint
    } else {
        gateway::ErrorKind::UnspecifiedError
    }
}

impl Error {
    pub(crate) fn new(phase: Phase, err: reqwest::Error) -> Error {
        Error {
            phase,
            kind: classify(&err),
            source: err,
        }
    }

    pub(crate) fn sending(err: reqwest::Error) -> Error {
        Error::new(Phase::Send, err)
    }

    pub(crate) fn reading_body(err: reqwest::Error) -> Error {
        Error::new(Phase::ReadBody, err)
    }

    /// The gateway error category this transport failure belongs to.
    pub(crate) fn gateway_kind(&self) -> gateway::ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Send => "sending the request",
            Phase::ReadBody => "reading the response",
        };

        write!(f, "{} while {}", self.kind, phase)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}
