//! BEP 15 response encoding.
use std::io::{self, Write};
use std::net::SocketAddr;

use byteorder::{NetworkEndian, WriteBytesExt};

use super::connection_cookie::Cookie;
use super::request::{TransactionId, ANNOUNCE_ACTION_ID, CONNECT_ACTION_ID, ERROR_ACTION_ID, SCRAPE_ACTION_ID};

/// A response ready to be serialized onto the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Connect(ConnectResponse),
    Announce(AnnounceResponse),
    Scrape(ScrapeResponse),
    Error(ErrorResponse),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectResponse {
    pub transaction_id: TransactionId,
    pub connection_id: Cookie,
}

/// An announce response. The header always carries action `1`; the
/// width of each peer entry (6 or 18 bytes) follows the address family
/// of the request, and peers of the other family are silently skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceResponse {
    pub transaction_id: TransactionId,
    pub interval: u32,
    pub leechers: u32,
    pub seeders: u32,
    pub ipv6: bool,
    pub peers: Vec<SocketAddr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TorrentScrapeStatistics {
    pub seeders: u32,
    pub completed: u32,
    pub leechers: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeResponse {
    pub transaction_id: TransactionId,
    pub torrent_stats: Vec<TorrentScrapeStatistics>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub transaction_id: TransactionId,
    pub message: String,
}

impl From<ConnectResponse> for Response {
    fn from(r: ConnectResponse) -> Self {
        Self::Connect(r)
    }
}

impl From<AnnounceResponse> for Response {
    fn from(r: AnnounceResponse) -> Self {
        Self::Announce(r)
    }
}

impl From<ScrapeResponse> for Response {
    fn from(r: ScrapeResponse) -> Self {
        Self::Scrape(r)
    }
}

impl From<ErrorResponse> for Response {
    fn from(r: ErrorResponse) -> Self {
        Self::Error(r)
    }
}

impl Response {
    /// The action label used for logs and the response-duration
    /// histogram.
    #[must_use]
    pub fn action_name(&self) -> &'static str {
        match self {
            Response::Connect(_) => "connect",
            Response::Announce(_) => "announce",
            Response::Scrape(_) => "scrape",
            Response::Error(_) => "error",
        }
    }

    /// Serializes the response in network byte order.
    ///
    /// # Errors
    ///
    /// Propagates writer errors; writing into a `Vec` cannot fail.
    pub fn write_bytes(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Response::Connect(r) => {
                writer.write_i32::<NetworkEndian>(CONNECT_ACTION_ID)?;
                writer.write_i32::<NetworkEndian>(r.transaction_id.0)?;
                writer.write_all(&r.connection_id)?;
            }
            Response::Announce(r) => {
                writer.write_i32::<NetworkEndian>(ANNOUNCE_ACTION_ID)?;
                writer.write_i32::<NetworkEndian>(r.transaction_id.0)?;
                writer.write_u32::<NetworkEndian>(r.interval)?;
                writer.write_u32::<NetworkEndian>(r.leechers)?;
                writer.write_u32::<NetworkEndian>(r.seeders)?;

                for peer in &r.peers {
                    match peer {
                        SocketAddr::V4(addr) if !r.ipv6 => {
                            writer.write_all(&addr.ip().octets())?;
                            writer.write_u16::<NetworkEndian>(addr.port())?;
                        }
                        SocketAddr::V6(addr) if r.ipv6 => {
                            writer.write_all(&addr.ip().octets())?;
                            writer.write_u16::<NetworkEndian>(addr.port())?;
                        }
                        // a peer of the other address family never fits
                        _ => {}
                    }
                }
            }
            Response::Scrape(r) => {
                writer.write_i32::<NetworkEndian>(SCRAPE_ACTION_ID)?;
                writer.write_i32::<NetworkEndian>(r.transaction_id.0)?;

                for stats in &r.torrent_stats {
                    writer.write_u32::<NetworkEndian>(stats.seeders)?;
                    writer.write_u32::<NetworkEndian>(stats.completed)?;
                    writer.write_u32::<NetworkEndian>(stats.leechers)?;
                }
            }
            Response::Error(r) => {
                writer.write_i32::<NetworkEndian>(ERROR_ACTION_ID)?;
                writer.write_i32::<NetworkEndian>(r.transaction_id.0)?;
                writer.write_all(r.message.as_bytes())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnounceResponse, ConnectResponse, ErrorResponse, Response, ScrapeResponse, TorrentScrapeStatistics};
    use crate::servers::udp::request::TransactionId;

    fn serialize(response: &Response) -> Vec<u8> {
        let mut bytes = Vec::new();
        response.write_bytes(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn a_connect_response_should_be_exactly_16_bytes() {
        let response = Response::from(ConnectResponse {
            transaction_id: TransactionId(0x0102_0304),
            connection_id: [1, 2, 3, 4, 5, 6, 7, 8],
        });

        let bytes = serialize(&response);

        assert_eq!(
            bytes,
            vec![0, 0, 0, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn an_ipv4_announce_response_should_use_6_byte_peer_entries() {
        let response = Response::from(AnnounceResponse {
            transaction_id: TransactionId(1),
            interval: 1800,
            leechers: 1,
            seeders: 2,
            ipv6: false,
            peers: vec!["126.0.0.1:8080".parse().unwrap()],
        });

        let bytes = serialize(&response);

        assert_eq!(bytes.len(), 20 + 6);
        assert_eq!(&bytes[0..4], &1i32.to_be_bytes()); // action: announce
        assert_eq!(&bytes[8..12], &1800u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_be_bytes());
        assert_eq!(&bytes[16..20], &2u32.to_be_bytes());
        assert_eq!(&bytes[20..24], &[126, 0, 0, 1]);
        assert_eq!(&bytes[24..26], &8080u16.to_be_bytes());
    }

    #[test]
    fn an_announce_response_should_skip_peers_of_the_other_family() {
        let response = Response::from(AnnounceResponse {
            transaction_id: TransactionId(1),
            interval: 1800,
            leechers: 0,
            seeders: 0,
            ipv6: false,
            peers: vec!["[::1]:8080".parse().unwrap(), "126.0.0.1:8080".parse().unwrap()],
        });

        assert_eq!(serialize(&response).len(), 20 + 6);
    }

    #[test]
    fn an_ipv6_announce_response_should_use_18_byte_peer_entries() {
        let response = Response::from(AnnounceResponse {
            transaction_id: TransactionId(1),
            interval: 1800,
            leechers: 0,
            seeders: 0,
            ipv6: true,
            peers: vec!["[::1]:8080".parse().unwrap()],
        });

        assert_eq!(serialize(&response).len(), 20 + 18);
    }

    #[test]
    fn a_scrape_response_should_keep_its_triples_in_order() {
        let response = Response::from(ScrapeResponse {
            transaction_id: TransactionId(9),
            torrent_stats: vec![
                TorrentScrapeStatistics {
                    seeders: 1,
                    completed: 2,
                    leechers: 3,
                },
                TorrentScrapeStatistics {
                    seeders: 4,
                    completed: 5,
                    leechers: 6,
                },
            ],
        });

        let bytes = serialize(&response);

        assert_eq!(&bytes[0..4], &2i32.to_be_bytes()); // action: scrape
        assert_eq!(&bytes[8..12], &1u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_be_bytes());
        assert_eq!(&bytes[16..20], &3u32.to_be_bytes());
        assert_eq!(&bytes[20..24], &4u32.to_be_bytes());
    }

    #[test]
    fn an_error_response_should_carry_its_message_as_utf8() {
        let response = Response::from(ErrorResponse {
            transaction_id: TransactionId(7),
            message: "bad connection id".to_owned(),
        });

        let bytes = serialize(&response);

        assert_eq!(&bytes[0..4], &3i32.to_be_bytes()); // action: error
        assert_eq!(&bytes[4..8], &7i32.to_be_bytes());
        assert_eq!(&bytes[8..], b"bad connection id");
    }
}
