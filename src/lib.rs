//! A [BEP 15](https://www.bittorrent.org/beps/bep_0015.html) UDP
//! BitTorrent tracker.
//!
//! The crate is organized in three layers:
//!
//! - [`primitives`]: the value types shared by every layer (info-hashes,
//!   peers, announce events, extension parameters).
//! - [`core`]: the tracker logic. It composes an ordered pipeline of
//!   authorization [`hooks`](crate::core::hooks) with the in-memory
//!   [peer store](crate::core::storage) and exposes the whole thing
//!   through the [`TrackerLogic`](crate::core::TrackerLogic) trait.
//! - [`servers`]: the UDP frontend. It owns the socket, mints and
//!   validates connection cookies, decodes and encodes BEP 15 datagrams
//!   and drives a [`TrackerLogic`](crate::core::TrackerLogic)
//!   implementation.
//!
//! The frontend never sees the concrete tracker type and the core never
//! sees a socket, so either side can be replaced independently: the
//! tracker logic can back other frontends, and the frontend can be
//! tested against a mocked logic.
pub mod core;
pub mod primitives;
pub mod servers;
pub mod shared;

/// The clock used everywhere in the crate.
///
/// In production builds this is the system clock. When the crate itself
/// is under test it is a stoppable clock that tests can set and advance
/// deterministically.
#[cfg(not(test))]
pub type CurrentClock = shared::clock::Working;

#[cfg(test)]
pub type CurrentClock = shared::clock::Stopped;
