//! The in-memory peer store.
//!
//! Swarms are sharded over a fixed set of independently locked maps so
//! that announces for different info-hashes proceed in parallel, while
//! all mutations of a single swarm are serialized by its shard lock.
//! Every entry carries an expiry time; readers skip expired entries and
//! the periodic [cleanup job](super::cleanup) removes them.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::PeerRole;
use crate::core::config::CoreConfig;
use crate::primitives::info_hash::InfoHash;
use crate::primitives::peer::Peer;
use crate::primitives::swarm_metadata::SwarmMetadata;
use crate::primitives::DurationSinceUnixEpoch;
use crate::shared::clock::Time as _;
use crate::CurrentClock;

/// Number of independently locked swarm maps. Must be a power of two.
const SHARD_COUNT: usize = 1024;

/// One swarm: who seeds, who leeches, and until when each entry is
/// considered alive.
#[derive(Debug, Default)]
struct Swarm {
    seeders: HashMap<Peer, DurationSinceUnixEpoch>,
    leechers: HashMap<Peer, DurationSinceUnixEpoch>,
    downloaded: u32,
}

impl Swarm {
    fn role_set(&mut self, role: PeerRole) -> &mut HashMap<Peer, DurationSinceUnixEpoch> {
        match role {
            PeerRole::Seeder => &mut self.seeders,
            PeerRole::Leecher => &mut self.leechers,
        }
    }

    fn is_empty(&self) -> bool {
        self.seeders.is_empty() && self.leechers.is_empty()
    }
}

type Shard = HashMap<InfoHash, Swarm>;

/// The in-memory peer store.
#[derive(Debug)]
pub struct InMemoryPeerStore {
    shards: Vec<Mutex<Shard>>,
    peer_lifetime: Duration,
    track_downloads: bool,
}

impl InMemoryPeerStore {
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(Shard::new())).collect(),
            peer_lifetime: config.peer_lifetime,
            track_downloads: config.track_downloads,
        }
    }

    fn shard_for(&self, info_hash: &InfoHash) -> &Mutex<Shard> {
        let prefix = usize::from(u16::from_be_bytes([info_hash.0[0], info_hash.0[1]]));
        &self.shards[prefix & (SHARD_COUNT - 1)]
    }

    fn lock_shard(&self, info_hash: &InfoHash) -> std::sync::MutexGuard<'_, Shard> {
        self.shard_for(info_hash)
            .lock()
            .expect("a peer-store shard lock should not be poisoned")
    }

    fn expiry(&self) -> DurationSinceUnixEpoch {
        CurrentClock::now() + self.peer_lifetime
    }

    /// Inserts or refreshes a peer in the given role. If the peer was
    /// in the opposite role it transitions atomically.
    pub fn put(&self, info_hash: &InfoHash, peer: &Peer, role: PeerRole) {
        let expiry = self.expiry();
        let mut shard = self.lock_shard(info_hash);

        let swarm = shard.entry(*info_hash).or_default();
        swarm.role_set(role.opposite()).remove(peer);
        swarm.role_set(role).insert(*peer, expiry);
    }

    /// Removes a peer from the given role. Missing peers are not an
    /// error.
    pub fn delete(&self, info_hash: &InfoHash, peer: &Peer, role: PeerRole) {
        let mut shard = self.lock_shard(info_hash);

        if let Some(swarm) = shard.get_mut(info_hash) {
            swarm.role_set(role).remove(peer);

            if swarm.is_empty() {
                shard.remove(info_hash);
            }
        }
    }

    /// Moves a peer from the leechers to the seeders of a swarm. The
    /// move happens under a single lock: no observer ever sees the peer
    /// in both sets or in neither.
    pub fn graduate_leecher(&self, info_hash: &InfoHash, peer: &Peer) {
        let expiry = self.expiry();
        let mut shard = self.lock_shard(info_hash);

        let swarm = shard.entry(*info_hash).or_default();
        swarm.leechers.remove(peer);
        swarm.seeders.insert(*peer, expiry);

        if self.track_downloads {
            swarm.downloaded = swarm.downloaded.saturating_add(1);
        }
    }

    /// Returns up to `num_want` live peers for an announcing peer,
    /// excluding the announcer itself.
    ///
    /// Leechers are served seeders first, then other leechers; seeders
    /// are served leechers only. Within a role, fresher entries come
    /// first.
    #[must_use]
    pub fn announce_peers(
        &self,
        info_hash: &InfoHash,
        announcer_is_seeder: bool,
        num_want: usize,
        announcer: &Peer,
    ) -> Vec<Peer> {
        let now = CurrentClock::now();
        let shard = self.lock_shard(info_hash);

        let Some(swarm) = shard.get(info_hash) else {
            return Vec::new();
        };

        let mut peers = Vec::with_capacity(num_want.min(swarm.seeders.len() + swarm.leechers.len()));

        if announcer_is_seeder {
            sample_freshest(&swarm.leechers, now, announcer, num_want, &mut peers);
        } else {
            sample_freshest(&swarm.seeders, now, announcer, num_want, &mut peers);
            sample_freshest(&swarm.leechers, now, announcer, num_want, &mut peers);
        }

        peers
    }

    /// Current live seeder/leecher counts for a swarm. An absent swarm
    /// reports all zeroes.
    #[must_use]
    pub fn scrape_swarm(&self, info_hash: &InfoHash) -> SwarmMetadata {
        let now = CurrentClock::now();
        let shard = self.lock_shard(info_hash);

        match shard.get(info_hash) {
            Some(swarm) => SwarmMetadata {
                complete: count_live(&swarm.seeders, now),
                downloaded: swarm.downloaded,
                incomplete: count_live(&swarm.leechers, now),
            },
            None => SwarmMetadata::zeroed(),
        }
    }

    /// Removes every entry whose expiry has passed and drops swarms
    /// that end up empty.
    pub fn remove_expired_peers(&self) {
        let now = CurrentClock::now();

        for shard in &self.shards {
            let mut shard = shard.lock().expect("a peer-store shard lock should not be poisoned");

            shard.retain(|_, swarm| {
                swarm.seeders.retain(|_, expiry| *expiry > now);
                swarm.leechers.retain(|_, expiry| *expiry > now);
                !swarm.is_empty()
            });
        }
    }
}

fn sample_freshest(
    set: &HashMap<Peer, DurationSinceUnixEpoch>,
    now: DurationSinceUnixEpoch,
    announcer: &Peer,
    num_want: usize,
    out: &mut Vec<Peer>,
) {
    if out.len() >= num_want {
        return;
    }

    let mut live: Vec<_> = set
        .iter()
        .filter(|(peer, expiry)| **expiry > now && *peer != announcer)
        .collect();

    live.sort_unstable_by(|a, b| b.1.cmp(a.1));

    out.extend(live.into_iter().take(num_want - out.len()).map(|(peer, _)| *peer));
}

fn count_live(set: &HashMap<Peer, DurationSinceUnixEpoch>, now: DurationSinceUnixEpoch) -> u32 {
    u32::try_from(set.values().filter(|expiry| **expiry > now).count()).unwrap_or(u32::MAX)
}
