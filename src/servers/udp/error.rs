//! Error types for the UDP frontend.
use thiserror::Error;

/// The minimum length of the connection-cookie keying material.
pub const MIN_PRIVATE_KEY_LEN: usize = 16;

/// Error produced on the packet path or while starting the server.
///
/// The `Display` form of the protocol variants is exactly what goes
/// into the BEP 15 error frame.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body does not decode. Requests shorter than the
    /// 16-byte header never produce this error; they are dropped
    /// without any response.
    #[error("malformed packet")]
    MalformedPacket,

    /// The connection cookie is missing, forged, expired or from the
    /// future.
    #[error("bad connection id")]
    BadConnectionId,

    /// The action field is none of connect/announce/scrape.
    #[error("unknown action")]
    UnknownAction,

    /// The configured private key is unusable. Fatal at startup.
    #[error("the private key must be at least {MIN_PRIVATE_KEY_LEN} bytes, got {len}")]
    PrivateKeyTooShort { len: usize },

    /// The server could not bind its socket. Fatal at startup.
    #[error("could not bind to {addr}: {source}")]
    UnableToBindToSocket { addr: std::net::SocketAddr, source: std::io::Error },

    /// The server task died instead of shutting down cleanly.
    #[error("the server task failed to shut down cleanly: {source}")]
    ShutdownFailed { source: tokio::task::JoinError },
}
