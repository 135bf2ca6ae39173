//! Core tracker configuration.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration of the tracker core: announce policy, peer lifetime
/// and peer-store behavior.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct CoreConfig {
    /// The interval peers are told to wait between announces.
    #[serde(default = "CoreConfig::default_announce_interval")]
    pub announce_interval: Duration,

    /// The minimum interval peers must respect between announces.
    #[serde(default = "CoreConfig::default_min_announce_interval")]
    pub min_announce_interval: Duration,

    /// How long a peer stays in a swarm without re-announcing.
    #[serde(default = "CoreConfig::default_peer_lifetime")]
    pub peer_lifetime: Duration,

    /// How many peers an announce response carries when the client asks
    /// for the server default (`numwant` of `-1` or `0`).
    #[serde(default = "CoreConfig::default_num_want")]
    pub default_num_want: u32,

    /// Whether to keep an approximate per-swarm download counter for
    /// scrape responses. The in-memory store has no persistent source
    /// for this number; when disabled, scrapes report zero.
    #[serde(default)]
    pub track_downloads: bool,

    /// How often the cleanup job prunes expired peers and empty swarms.
    #[serde(default = "CoreConfig::default_inactive_peer_cleanup_interval")]
    pub inactive_peer_cleanup_interval: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            announce_interval: Self::default_announce_interval(),
            min_announce_interval: Self::default_min_announce_interval(),
            peer_lifetime: Self::default_peer_lifetime(),
            default_num_want: Self::default_num_want(),
            track_downloads: false,
            inactive_peer_cleanup_interval: Self::default_inactive_peer_cleanup_interval(),
        }
    }
}

impl CoreConfig {
    fn default_announce_interval() -> Duration {
        Duration::from_secs(1800)
    }

    fn default_min_announce_interval() -> Duration {
        Duration::from_secs(900)
    }

    fn default_peer_lifetime() -> Duration {
        Duration::from_secs(2100)
    }

    fn default_num_want() -> u32 {
        50
    }

    fn default_inactive_peer_cleanup_interval() -> Duration {
        Duration::from_secs(600)
    }
}
