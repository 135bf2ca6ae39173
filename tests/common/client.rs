//! A raw-datagram UDP tracker client for contract tests.
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

const RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);

/// The BEP 15 protocol id a connect request must carry.
pub const PROTOCOL_ID: [u8; 8] = [0x00, 0x00, 0x04, 0x17, 0x27, 0x10, 0x19, 0x80];

pub struct UdpTrackerClient {
    socket: UdpSocket,
    tracker_addr: SocketAddr,
}

impl UdpTrackerClient {
    pub async fn new(tracker_addr: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("the client socket should bind");

        Self { socket, tracker_addr }
    }

    pub async fn send(&self, packet: &[u8]) {
        self.socket
            .send_to(packet, self.tracker_addr)
            .await
            .expect("the client should be able to send");
    }

    /// Receives one datagram, or `None` on timeout.
    pub async fn receive(&self) -> Option<Vec<u8>> {
        let mut buffer = [0u8; 2048];

        match timeout(RECEIVE_TIMEOUT, self.socket.recv_from(&mut buffer)).await {
            Ok(Ok((len, _from))) => Some(buffer[..len].to_vec()),
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Performs the connect handshake and returns the connection id.
    pub async fn connect(&self, transaction_id: i32) -> [u8; 8] {
        let mut packet = Vec::new();
        packet.extend_from_slice(&PROTOCOL_ID);
        packet.extend_from_slice(&0i32.to_be_bytes());
        packet.extend_from_slice(&transaction_id.to_be_bytes());

        self.send(&packet).await;

        let response = self.receive().await.expect("a connect request should be answered");
        assert_eq!(response.len(), 16, "a connect response is exactly 16 bytes");
        assert_eq!(&response[0..4], &0i32.to_be_bytes(), "action should be connect");
        assert_eq!(&response[4..8], &transaction_id.to_be_bytes());

        response[8..16].try_into().unwrap()
    }
}

/// Builder for raw announce packets.
pub struct AnnounceBuilder {
    pub connection_id: [u8; 8],
    pub transaction_id: i32,
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
    pub downloaded: u64,
    pub left: u64,
    pub uploaded: u64,
    pub event: i32,
    pub key: u32,
    pub num_want: i32,
    pub port: u16,
    pub url_data: Option<Vec<u8>>,
}

impl AnnounceBuilder {
    pub fn new(connection_id: [u8; 8], info_hash: [u8; 20]) -> Self {
        Self {
            connection_id,
            transaction_id: 1,
            info_hash,
            peer_id: [0xBB; 20],
            downloaded: 0,
            left: 1,
            uploaded: 0,
            event: 2, // started
            key: 0,
            num_want: 50,
            port: 6881,
            url_data: None,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(&self.connection_id);
        packet.extend_from_slice(&1i32.to_be_bytes()); // action: announce
        packet.extend_from_slice(&self.transaction_id.to_be_bytes());
        packet.extend_from_slice(&self.info_hash);
        packet.extend_from_slice(&self.peer_id);
        packet.extend_from_slice(&self.downloaded.to_be_bytes());
        packet.extend_from_slice(&self.left.to_be_bytes());
        packet.extend_from_slice(&self.uploaded.to_be_bytes());
        packet.extend_from_slice(&self.event.to_be_bytes());
        packet.extend_from_slice(&[0, 0, 0, 0]); // no ip override
        packet.extend_from_slice(&self.key.to_be_bytes());
        packet.extend_from_slice(&self.num_want.to_be_bytes());
        packet.extend_from_slice(&self.port.to_be_bytes());

        if let Some(url_data) = &self.url_data {
            for chunk in url_data.chunks(255) {
                packet.push(0x2);
                packet.push(u8::try_from(chunk.len()).unwrap());
                packet.extend_from_slice(chunk);
            }
            packet.push(0x0);
        }

        packet
    }
}

/// Builds a raw scrape packet.
pub fn scrape_packet(connection_id: [u8; 8], transaction_id: i32, info_hashes: &[[u8; 20]]) -> Vec<u8> {
    let mut packet = Vec::new();
    packet.extend_from_slice(&connection_id);
    packet.extend_from_slice(&2i32.to_be_bytes()); // action: scrape
    packet.extend_from_slice(&transaction_id.to_be_bytes());
    for info_hash in info_hashes {
        packet.extend_from_slice(info_hash);
    }
    packet
}

/// A decoded announce response.
pub struct AnnounceResponse {
    pub transaction_id: i32,
    pub interval: u32,
    pub leechers: u32,
    pub seeders: u32,
    pub peers: Vec<SocketAddr>,
}

pub fn parse_announce_response(bytes: &[u8]) -> AnnounceResponse {
    assert!(bytes.len() >= 20, "an announce response is at least 20 bytes");
    assert_eq!(&bytes[0..4], &1i32.to_be_bytes(), "action should be announce");

    let peers = bytes[20..]
        .chunks_exact(6)
        .map(|entry| {
            let ip = std::net::Ipv4Addr::new(entry[0], entry[1], entry[2], entry[3]);
            let port = u16::from_be_bytes([entry[4], entry[5]]);
            SocketAddr::new(ip.into(), port)
        })
        .collect();

    AnnounceResponse {
        transaction_id: i32::from_be_bytes(bytes[4..8].try_into().unwrap()),
        interval: u32::from_be_bytes(bytes[8..12].try_into().unwrap()),
        leechers: u32::from_be_bytes(bytes[12..16].try_into().unwrap()),
        seeders: u32::from_be_bytes(bytes[16..20].try_into().unwrap()),
        peers,
    }
}

/// A decoded scrape response entry.
pub struct ScrapeEntry {
    pub seeders: u32,
    pub completed: u32,
    pub leechers: u32,
}

pub fn parse_scrape_response(bytes: &[u8], transaction_id: i32) -> Vec<ScrapeEntry> {
    assert!(bytes.len() >= 8);
    assert_eq!(&bytes[0..4], &2i32.to_be_bytes(), "action should be scrape");
    assert_eq!(&bytes[4..8], &transaction_id.to_be_bytes());

    bytes[8..]
        .chunks_exact(12)
        .map(|entry| ScrapeEntry {
            seeders: u32::from_be_bytes(entry[0..4].try_into().unwrap()),
            completed: u32::from_be_bytes(entry[4..8].try_into().unwrap()),
            leechers: u32::from_be_bytes(entry[8..12].try_into().unwrap()),
        })
        .collect()
}

/// Decodes an error response, returning (transaction id, message).
pub fn parse_error_response(bytes: &[u8]) -> (i32, String) {
    assert!(bytes.len() >= 8);
    assert_eq!(&bytes[0..4], &3i32.to_be_bytes(), "action should be error");

    (
        i32::from_be_bytes(bytes[4..8].try_into().unwrap()),
        String::from_utf8_lossy(&bytes[8..]).into_owned(),
    )
}
