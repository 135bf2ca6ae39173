//! The request and response records exchanged between a frontend and
//! the tracker logic.
use std::net::IpAddr;
use std::time::Duration;

use super::info_hash::InfoHash;
use super::params::Params;
use super::peer::Peer;
use super::swarm_metadata::SwarmMetadata;
use super::AnnounceEvent;

/// An announce, as seen by the tracker logic.
///
/// The peer address is the *effective* one: the frontend has already
/// applied its IP-spoofing policy, so `peer.peer_addr` is either the
/// datagram source address or a permitted client-provided override.
#[derive(Clone, Debug)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer: Peer,
    pub event: AnnounceEvent,
    /// How many peers the requester wants. Explicit amounts are already
    /// clamped by the frontend to what fits in a response datagram.
    pub num_want: PeersWanted,
    /// Bytes the peer still has to download. Zero marks a seeder.
    pub left: u64,
    /// Whether the announce came in over the IPv6 flavor of the
    /// protocol.
    pub ipv6: bool,
    /// BEP 41 extension parameters, if the client sent any.
    pub params: Option<Params>,
}

/// What the tracker logic answers to an announce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnounceData {
    pub interval: Duration,
    pub min_interval: Duration,
    /// Seeder count for the swarm.
    pub complete: u32,
    /// Leecher count for the swarm.
    pub incomplete: u32,
    /// A sample of other peers, excluding the requester.
    pub peers: Vec<Peer>,
}

/// A scrape, as seen by the tracker logic.
#[derive(Clone, Debug)]
pub struct ScrapeRequest {
    pub info_hashes: Vec<InfoHash>,
}

/// What the tracker logic answers to a scrape. `files[i]` corresponds
/// to `info_hashes[i]` of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrapeData {
    pub files: Vec<SwarmMetadata>,
}

impl ScrapeData {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, swarm_metadata: SwarmMetadata) {
        self.files.push(swarm_metadata);
    }
}

/// How many peers an announcing client wants in the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PeersWanted {
    /// The client left the amount to the server (`numwant` of `-1` or
    /// `0` on the wire).
    #[default]
    Default,
    /// The client asked for a specific amount.
    Only { amount: u32 },
}

impl PeersWanted {
    /// The concrete amount, substituting the server default where the
    /// client did not ask for one.
    #[must_use]
    pub fn resolve(&self, server_default: u32) -> u32 {
        match self {
            Self::Default => server_default,
            Self::Only { amount } => *amount,
        }
    }
}

impl From<i32> for PeersWanted {
    fn from(value: i32) -> Self {
        match u32::try_from(value) {
            Ok(amount) if amount > 0 => Self::Only { amount },
            _ => Self::Default,
        }
    }
}

/// Ambient, per-request state threaded through the hook pipeline.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Set by the frontend on the scrape path: true iff the datagram
    /// source address was IPv6.
    pub scrape_is_ipv6: bool,
}

/// Derives the effective peer IP for an announce: the client-provided
/// override when the policy permits one, the datagram source address
/// otherwise.
///
/// Note that a permitted override is not covered by the connection-id
/// binding: the cookie authenticates the *source* address, so a
/// correctly connected client may still announce on behalf of another
/// IP. That is the documented price of `allow_ip_spoofing`.
#[must_use]
pub fn effective_peer_ip(source_ip: IpAddr, ip_override: Option<IpAddr>, allow_ip_spoofing: bool) -> IpAddr {
    match ip_override {
        Some(ip) if allow_ip_spoofing => ip,
        _ => source_ip,
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::{effective_peer_ip, PeersWanted};

    #[test]
    fn a_non_positive_numwant_should_mean_the_server_default() {
        assert_eq!(PeersWanted::from(-1), PeersWanted::Default);
        assert_eq!(PeersWanted::from(0), PeersWanted::Default);
        assert_eq!(PeersWanted::from(50), PeersWanted::Only { amount: 50 });
    }

    #[test]
    fn resolving_should_substitute_the_server_default_only_when_asked() {
        assert_eq!(PeersWanted::Default.resolve(50), 50);
        assert_eq!(PeersWanted::Only { amount: 3 }.resolve(50), 3);
    }

    const SOURCE: IpAddr = IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1));
    const OVERRIDE: IpAddr = IpAddr::V4(Ipv4Addr::new(126, 0, 0, 2));

    #[test]
    fn it_should_use_the_source_ip_when_spoofing_is_forbidden() {
        assert_eq!(effective_peer_ip(SOURCE, Some(OVERRIDE), false), SOURCE);
    }

    #[test]
    fn it_should_honor_the_override_when_spoofing_is_allowed() {
        assert_eq!(effective_peer_ip(SOURCE, Some(OVERRIDE), true), OVERRIDE);
    }

    #[test]
    fn it_should_fall_back_to_the_source_ip_without_an_override() {
        assert_eq!(effective_peer_ip(SOURCE, None, true), SOURCE);
    }
}
