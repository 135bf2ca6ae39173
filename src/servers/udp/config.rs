//! UDP tracker frontend configuration.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration of the UDP frontend.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct UdpTrackerConfig {
    /// The address the tracker will bind to.
    /// The format is `ip:port`, for example `0.0.0.0:6969`. If you want
    /// the operating system to choose a random port, use port `0`.
    #[serde(default = "UdpTrackerConfig::default_bind_address")]
    pub bind_address: SocketAddr,

    /// Keying material for the connection-cookie MAC. Must be at least
    /// 16 bytes; the server refuses to start otherwise.
    #[serde(default)]
    pub private_key: String,

    /// How far a connection cookie's issue time may lie from "now"
    /// before the cookie is rejected.
    #[serde(default = "UdpTrackerConfig::default_max_clock_skew")]
    pub max_clock_skew: Duration,

    /// Whether to honor the IP field of announce requests.
    ///
    /// The connection cookie binds the datagram *source* address, not
    /// the announced one, so with this enabled a correctly connected
    /// client may register peers under a different IP.
    #[serde(default)]
    pub allow_ip_spoofing: bool,
}

impl Default for UdpTrackerConfig {
    fn default() -> Self {
        Self {
            bind_address: Self::default_bind_address(),
            private_key: String::new(),
            max_clock_skew: Self::default_max_clock_skew(),
            allow_ip_spoofing: false,
        }
    }
}

impl UdpTrackerConfig {
    fn default_bind_address() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 6969)
    }

    fn default_max_clock_skew() -> Duration {
        Duration::from_secs(60)
    }
}
