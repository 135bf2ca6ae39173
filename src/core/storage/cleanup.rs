//! Periodic eviction of expired peers.
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tracing::instrument;

use super::in_memory::InMemoryPeerStore;
use crate::core::config::CoreConfig;
use crate::servers::signals::Halted;

/// Starts the cleanup job for a peer store.
///
/// The job holds only a weak reference: dropping the store stops the
/// job on its next tick, and a halt message stops it immediately.
#[must_use]
#[instrument(skip(config, peer_store, rx_halt))]
pub fn start_job(
    config: &CoreConfig,
    peer_store: &Arc<InMemoryPeerStore>,
    mut rx_halt: tokio::sync::oneshot::Receiver<Halted>,
) -> JoinHandle<()> {
    let weak_peer_store: Weak<InMemoryPeerStore> = Arc::downgrade(peer_store);
    let interval = config.inactive_peer_cleanup_interval;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.tick().await;

        loop {
            tokio::select! {
                halted = &mut rx_halt => {
                    tracing::info!("Stopping peer cleanup job: {halted:?}");
                    break;
                }
                _ = interval.tick() => {
                    let Some(peer_store) = weak_peer_store.upgrade() else {
                        break;
                    };

                    tracing::debug!("Removing expired peers..");
                    peer_store.remove_expired_peers();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::start_job;
    use crate::core::config::CoreConfig;
    use crate::core::storage::in_memory::InMemoryPeerStore;
    use crate::servers::signals::Halted;

    #[tokio::test]
    async fn it_should_stop_when_halted() {
        let config = CoreConfig {
            inactive_peer_cleanup_interval: Duration::from_secs(3600),
            ..Default::default()
        };
        let peer_store = Arc::new(InMemoryPeerStore::new(&config));

        let (tx_halt, rx_halt) = oneshot::channel();
        let job = start_job(&config, &peer_store, rx_halt);

        tx_halt.send(Halted::Normal).unwrap();

        job.await.unwrap();
    }

    #[tokio::test]
    async fn it_should_stop_when_the_store_is_dropped() {
        let config = CoreConfig {
            inactive_peer_cleanup_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let peer_store = Arc::new(InMemoryPeerStore::new(&config));

        let (_tx_halt, rx_halt) = oneshot::channel();
        let job = start_job(&config, &peer_store, rx_halt);

        drop(peer_store);

        job.await.unwrap();
    }
}
