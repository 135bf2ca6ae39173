//! Primitive types shared by the tracker core and the frontends.
//!
//! These are the wire-level value types of the `BitTorrent` tracker
//! protocol family: swarm identifiers, peers and their compact binary
//! form, announce events and the BEP 41 extension parameters.
pub mod core;
pub mod info_hash;
pub mod params;
pub mod peer;
pub mod swarm_metadata;

use serde::{Deserialize, Serialize};

/// Duration since the Unix epoch.
pub type DurationSinceUnixEpoch = std::time::Duration;

/// The event a peer reports with an announce.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AnnounceEvent {
    /// A regular, periodic announce.
    #[default]
    None,
    /// The peer finished downloading the torrent.
    Completed,
    /// The peer joined the swarm.
    Started,
    /// The peer is leaving the swarm.
    Stopped,
}

impl AnnounceEvent {
    /// Decodes the BEP 15 event field. Any value outside `0..=3` is a
    /// malformed packet.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Completed),
            2 => Some(Self::Started),
            3 => Some(Self::Stopped),
            _ => None,
        }
    }
}
