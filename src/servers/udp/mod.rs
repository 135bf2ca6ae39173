//! The UDP tracker frontend (BEP 15).
//!
//! One datagram, one request: the server loop hands every received
//! packet to an independent task that validates the connection cookie,
//! decodes the request, drives the [`TrackerLogic`](crate::core::TrackerLogic)
//! collaborator and writes the response back on the same socket.
//!
//! Packets shorter than the 16-byte request header are dropped without
//! a response, so the tracker cannot be used as an amplification
//! reflector.
pub mod config;
pub mod connection_cookie;
pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod statistics;

use std::net::SocketAddr;

use bytes::BytesMut;

pub const UDP_TRACKER_LOG_TARGET: &str = "UDP TRACKER";

/// Receive buffer size. No BEP 15 request is larger: the biggest legal
/// packet is a full scrape (16 + 74 * 20 = 1496 bytes).
pub const MAX_PACKET_SIZE: usize = 2048;

/// Scrape requests are capped at 74 info-hashes per BEP 15; anything
/// beyond that would not fit a 1500-byte MTU anyway.
pub const MAX_SCRAPE_TORRENTS: usize = 74;

/// How many peer entries fit an IPv4 announce response within a
/// 1500-byte MTU: (1500 - 20 IP - 8 UDP - 20 header) / 6.
pub const MAX_RESPONSE_PEERS_IPV4: usize = 242;

/// How many peer entries fit an IPv6 announce response within a
/// 1500-byte MTU: (1500 - 40 IP - 8 UDP - 20 header) / 18.
pub const MAX_RESPONSE_PEERS_IPV6: usize = 79;

/// A datagram as received from the socket, with its source address.
/// The payload buffer is owned: it comes from the buffer pool and goes
/// back when the handler is done with it.
#[derive(Debug)]
pub struct RawRequest {
    pub payload: BytesMut,
    pub from: SocketAddr,
}
