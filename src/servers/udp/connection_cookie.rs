//! Minting and checking connection cookies (BEP 15 connection ids).
//!
//! A client first sends a `connect` request carrying the fixed protocol
//! id and gets back an 8-byte connection id, which it must echo on
//! every announce and scrape. The tracker stores nothing: the cookie is
//! self-authenticating. Its first 4 bytes are the issue time in unix
//! seconds and its last 4 bytes a truncated keyed MAC over the issue
//! time and the client address, so only the tracker can mint a cookie
//! that later checks out for a given source IP and time window.
//!
//! Because an attacker cannot forge a cookie for a spoofed source
//! address, the tracker never sends an announce response (the only
//! amplifying payload) anywhere but to a verified address.
use std::net::IpAddr;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::{Error, MIN_PRIVATE_KEY_LEN};
use crate::primitives::DurationSinceUnixEpoch;

/// The fixed connection id a client must send with a `connect` request
/// (the BEP 15 protocol id).
pub const INITIAL_CONNECTION_ID: [u8; 8] = 0x0000_0417_2710_1980_i64.to_be_bytes();

/// An 8-byte connection cookie.
pub type Cookie = [u8; 8];

/// The keying material for cookie MACs.
#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// # Errors
    ///
    /// Fails when the key material is shorter than
    /// [`MIN_PRIVATE_KEY_LEN`] bytes.
    pub fn new(private_key: &str) -> Result<Self, Error> {
        if private_key.len() < MIN_PRIVATE_KEY_LEN {
            return Err(Error::PrivateKeyTooShort {
                len: private_key.len(),
            });
        }

        Ok(Self(private_key.as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never log key material
        write!(f, "Secret(..)")
    }
}

/// Mints a cookie for a client address at the given issue time.
#[must_use]
pub fn make(ip: &IpAddr, issued_at: DurationSinceUnixEpoch, secret: &Secret) -> Cookie {
    let timestamp = truncate_timestamp(issued_at);

    let tag = tag(ip, timestamp, secret);

    let mut cookie = [0u8; 8];
    cookie[..4].copy_from_slice(&timestamp.to_be_bytes());
    cookie[4..].copy_from_slice(&tag[..4]);
    cookie
}

/// Checks a cookie against a client address: the embedded issue time
/// must lie within `max_clock_skew` of `now` and the MAC must match.
/// The MAC comparison is constant-time.
///
/// # Errors
///
/// Returns [`Error::BadConnectionId`] when the cookie is expired, from
/// the future, or forged.
pub fn check(
    cookie: &Cookie,
    ip: &IpAddr,
    now: DurationSinceUnixEpoch,
    max_clock_skew: Duration,
    secret: &Secret,
) -> Result<(), Error> {
    let timestamp = u32::from_be_bytes(cookie[..4].try_into().expect("the slice is exactly 4 bytes"));

    let skew = u64::from(truncate_timestamp(now)).abs_diff(u64::from(timestamp));
    if skew > max_clock_skew.as_secs() {
        return Err(Error::BadConnectionId);
    }

    mac(ip, timestamp, secret)
        .verify_truncated_left(&cookie[4..])
        .map_err(|_| Error::BadConnectionId)
}

fn truncate_timestamp(time: DurationSinceUnixEpoch) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let timestamp = time.as_secs() as u32;
    timestamp
}

fn mac(ip: &IpAddr, timestamp: u32, secret: &Secret) -> Hmac<Sha256> {
    let mut mac = Hmac::<Sha256>::new_from_slice(&secret.0).expect("hmac accepts keys of any length");

    mac.update(&timestamp.to_be_bytes());
    match ip {
        IpAddr::V4(ip) => mac.update(&ip.octets()),
        IpAddr::V6(ip) => mac.update(&ip.octets()),
    }

    mac
}

fn tag(ip: &IpAddr, timestamp: u32, secret: &Secret) -> [u8; 32] {
    mac(ip, timestamp, secret).finalize().into_bytes().into()
}
