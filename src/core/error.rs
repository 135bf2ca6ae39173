//! The error taxonomy of the tracker logic and its hooks.
use thiserror::Error;

/// An error produced while handling an announce or scrape.
///
/// The two variants matter to the frontend in different ways: a
/// [`Error::Client`] message is written verbatim into the BEP 15 error
/// frame, while anything internal is answered with a generic message
/// and logged with full detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A client-facing rejection, e.g. `unapproved client`.
    #[error("{message}")]
    Client { message: String },

    /// An unexpected failure inside the tracker. Never shown to peers.
    #[error("internal server error: {message}")]
    Internal { message: String },
}

impl Error {
    #[must_use]
    pub fn client(message: &str) -> Self {
        Self::Client {
            message: message.to_owned(),
        }
    }

    #[must_use]
    pub fn internal(message: &str) -> Self {
        Self::Internal {
            message: message.to_owned(),
        }
    }

    /// True when the error message may be surfaced to the peer.
    #[must_use]
    pub fn is_client_facing(&self) -> bool {
        matches!(self, Self::Client { .. })
    }
}
