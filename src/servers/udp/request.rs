//! BEP 15 request decoding.
use std::io::{Cursor, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use byteorder::{NetworkEndian, ReadBytesExt};

use super::connection_cookie::Cookie;
use super::error::Error;
use super::MAX_SCRAPE_TORRENTS;
use crate::primitives::info_hash::InfoHash;
use crate::primitives::params::Params;
use crate::primitives::peer::PeerId;
use crate::primitives::AnnounceEvent;

pub const CONNECT_ACTION_ID: i32 = 0;
pub const ANNOUNCE_ACTION_ID: i32 = 1;
pub const SCRAPE_ACTION_ID: i32 = 2;
pub const ERROR_ACTION_ID: i32 = 3;
pub const ANNOUNCE_V6_ACTION_ID: i32 = 4;

/// Every request starts with a 16-byte header.
pub const REQUEST_HEADER_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionId(pub i32);

/// The common request header: `connection_id(8) | action(4) | transaction_id(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestHeader {
    pub connection_id: Cookie,
    pub action: i32,
    pub transaction_id: TransactionId,
}

impl RequestHeader {
    /// Parses the header. `None` means the packet is shorter than the
    /// header; such packets must be dropped without any response.
    #[must_use]
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < REQUEST_HEADER_LEN {
            return None;
        }

        let connection_id: Cookie = packet[0..8].try_into().expect("the slice is exactly 8 bytes");
        let action = i32::from_be_bytes(packet[8..12].try_into().expect("the slice is exactly 4 bytes"));
        let transaction_id = i32::from_be_bytes(packet[12..16].try_into().expect("the slice is exactly 4 bytes"));

        Some(Self {
            connection_id,
            action,
            transaction_id: TransactionId(transaction_id),
        })
    }
}

/// A decoded announce request, before any policy is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub downloaded: u64,
    pub left: u64,
    pub uploaded: u64,
    pub event: AnnounceEvent,
    /// The client-provided IP, if it sent a non-zero one. Only honored
    /// under the `allow_ip_spoofing` policy.
    pub ip_override: Option<IpAddr>,
    pub key: u32,
    /// Requested number of peers; `-1` and `0` mean the server default.
    pub num_want: i32,
    pub port: u16,
    /// BEP 41 extension parameters, if any were appended.
    pub params: Option<Params>,
}

/// Decodes an announce body (the bytes after the request header).
///
/// # Errors
///
/// Returns [`Error::MalformedPacket`] when the body is truncated, the
/// event value is unknown, or the BEP 41 options are broken.
pub fn parse_announce(packet: &[u8], ipv6: bool) -> Result<AnnounceRequest, Error> {
    let body = packet.get(REQUEST_HEADER_LEN..).ok_or(Error::MalformedPacket)?;
    let mut cursor = Cursor::new(body);

    let mut info_hash = [0u8; 20];
    let mut peer_id = [0u8; 20];

    cursor.read_exact(&mut info_hash).map_err(|_| Error::MalformedPacket)?;
    cursor.read_exact(&mut peer_id).map_err(|_| Error::MalformedPacket)?;

    let downloaded = cursor.read_u64::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;
    let left = cursor.read_u64::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;
    let uploaded = cursor.read_u64::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;

    let event = cursor.read_i32::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;
    let event = AnnounceEvent::from_wire(event).ok_or(Error::MalformedPacket)?;

    let ip_override = if ipv6 {
        let mut ip = [0u8; 16];
        cursor.read_exact(&mut ip).map_err(|_| Error::MalformedPacket)?;
        (ip != [0u8; 16]).then(|| IpAddr::V6(Ipv6Addr::from(ip)))
    } else {
        let mut ip = [0u8; 4];
        cursor.read_exact(&mut ip).map_err(|_| Error::MalformedPacket)?;
        (ip != [0u8; 4]).then(|| IpAddr::V4(Ipv4Addr::from(ip)))
    };

    let key = cursor.read_u32::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;
    let num_want = cursor.read_i32::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;
    let port = cursor.read_u16::<NetworkEndian>().map_err(|_| Error::MalformedPacket)?;

    #[allow(clippy::cast_possible_truncation)]
    let options_start = cursor.position() as usize;
    let params = parse_options(&body[options_start..])?;

    Ok(AnnounceRequest {
        info_hash: InfoHash(info_hash),
        peer_id: PeerId(peer_id),
        downloaded,
        left,
        uploaded,
        event,
        ip_override,
        key,
        num_want,
        port,
        params,
    })
}

/// Decodes a scrape body: 1 to 74 concatenated info-hashes. Requests
/// carrying more than 74 are truncated, an empty one is malformed.
///
/// # Errors
///
/// Returns [`Error::MalformedPacket`] when no whole info-hash is
/// present.
pub fn parse_scrape(packet: &[u8]) -> Result<Vec<InfoHash>, Error> {
    let info_hashes: Vec<InfoHash> = packet
        .get(REQUEST_HEADER_LEN..)
        .ok_or(Error::MalformedPacket)?
        .chunks_exact(20)
        .take(MAX_SCRAPE_TORRENTS)
        .map(|chunk| InfoHash(chunk.try_into().expect("the chunk is exactly 20 bytes")))
        .collect();

    if info_hashes.is_empty() {
        return Err(Error::MalformedPacket);
    }

    Ok(info_hashes)
}

/// Walks the BEP 41 option list that may follow an announce body.
///
/// `0x00` ends the list, `0x01` is a nop, `0x02` is length-prefixed
/// URL-data. An unknown option type ends parsing without error, as the
/// BEP requires for forward compatibility; a truncated length-prefixed
/// option is malformed.
fn parse_options(bytes: &[u8]) -> Result<Option<Params>, Error> {
    const END_OF_OPTIONS: u8 = 0x0;
    const NOP: u8 = 0x1;
    const URL_DATA: u8 = 0x2;

    let mut url_data = Vec::new();
    let mut position = 0;

    while position < bytes.len() {
        match bytes[position] {
            END_OF_OPTIONS => break,
            NOP => position += 1,
            URL_DATA => {
                let length = *bytes.get(position + 1).ok_or(Error::MalformedPacket)? as usize;
                let start = position + 2;
                let segment = bytes.get(start..start + length).ok_or(Error::MalformedPacket)?;
                url_data.extend_from_slice(segment);
                position = start + length;
            }
            _ => break,
        }
    }

    if url_data.is_empty() {
        return Ok(None);
    }

    let url_data = String::from_utf8(url_data).map_err(|_| Error::MalformedPacket)?;

    Ok(Some(Params::from_url_data(&url_data)))
}
