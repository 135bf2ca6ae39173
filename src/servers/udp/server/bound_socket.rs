//! A bound UDP socket.
use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::net::UdpSocket;

use crate::servers::udp::error::Error;

/// The frontend's socket. Binding happens at construction; a failure
/// there is fatal to startup.
#[derive(Debug)]
pub struct BoundSocket {
    socket: UdpSocket,
}

impl BoundSocket {
    /// # Errors
    ///
    /// Fails when the address cannot be bound.
    pub async fn new(addr: SocketAddr) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| Error::UnableToBindToSocket { addr, source })?;

        Ok(Self { socket })
    }

    /// The actual local address, useful when binding to port 0.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.socket.local_addr().expect("a bound socket should have a local address")
    }

    /// Receives one datagram into `buffer`, returning the sender.
    pub async fn recv_buf_from(&self, buffer: &mut BytesMut) -> io::Result<SocketAddr> {
        let (_len, from) = self.socket.recv_buf_from(buffer).await?;
        Ok(from)
    }

    /// Sends a payload; UDP writes are safe for concurrent use.
    pub async fn send_to(&self, payload: &[u8], target: &SocketAddr) -> io::Result<usize> {
        self.socket.send_to(payload, *target).await
    }
}
