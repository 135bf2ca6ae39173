//! The 20-byte identifier of a `BitTorrent` swarm.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The opaque identifier of a swarm: the SHA-1 of a torrent's info
/// dictionary. Equality is byte equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    /// The raw 20 bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({self})")
    }
}

impl From<[u8; 20]> for InfoHash {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Error returned when parsing an info-hash from its hex form.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseInfoHashError {
    #[error("an info-hash is 40 hex characters, got {len}")]
    InvalidLength { len: usize },

    #[error("invalid hex digit in info-hash")]
    InvalidHexDigit,
}

impl FromStr for InfoHash {
    type Err = ParseInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(ParseInfoHashError::InvalidLength { len: s.len() });
        }

        let mut bytes = [0u8; 20];
        for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| ParseInfoHashError::InvalidHexDigit)?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| ParseInfoHashError::InvalidHexDigit)?;
        }

        Ok(Self(bytes))
    }
}
