//! Peers and their identifiers.
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// The opaque 20-byte identifier a client assigns to itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub [u8; 20]);

impl PeerId {
    /// The leading 6 bytes: the vendor/version prefix conventionally
    /// used to identify the client software.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        let mut prefix = [0u8; 6];
        prefix.copy_from_slice(&self.0[..6]);
        ClientId(prefix)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId(")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// The 6-byte client software prefix of a [`PeerId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub [u8; 6]);

impl TryFrom<&[u8]> for ClientId {
    type Error = InvalidClientId;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 6] = bytes.try_into().map_err(|_| InvalidClientId { len: bytes.len() })?;
        Ok(Self(bytes))
    }
}

/// Error returned when a client id is not exactly 6 bytes.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("a client id is exactly 6 bytes, got {len}")]
pub struct InvalidClientId {
    pub len: usize,
}

/// A peer in a swarm. Two peers are equal iff id, IP and port are all
/// equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Peer {
    pub peer_id: PeerId,
    pub peer_addr: SocketAddr,
}

impl Peer {
    #[must_use]
    pub fn new(peer_id: PeerId, peer_addr: SocketAddr) -> Self {
        Self { peer_id, peer_addr }
    }

    /// The compact binary form `peer-id ‖ port ‖ ip`: 26 bytes for an
    /// IPv4 peer, 38 for an IPv6 one. The ip/port tail is the same
    /// 6/18-byte entry the announce response carries.
    #[must_use]
    pub fn to_key_bytes(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(38);
        key.extend_from_slice(&self.peer_id.0);
        key.extend_from_slice(&self.peer_addr.port().to_be_bytes());
        match self.peer_addr.ip() {
            IpAddr::V4(ip) => key.extend_from_slice(&ip.octets()),
            IpAddr::V6(ip) => key.extend_from_slice(&ip.octets()),
        }
        key
    }
}
