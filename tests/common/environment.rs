use std::net::SocketAddr;
use std::sync::Arc;

use hive_tracker::core::config::CoreConfig;
use hive_tracker::core::hooks::Hook;
use hive_tracker::core::storage::in_memory::InMemoryPeerStore;
use hive_tracker::core::Tracker;
use hive_tracker::servers::udp::config::UdpTrackerConfig;
use hive_tracker::servers::udp::server::{RunningUdpServer, UdpServer};
use hive_tracker::servers::udp::statistics;

pub const TEST_PRIVATE_KEY: &str = "integration test private key material";

/// A running tracker bound to an ephemeral localhost port.
pub struct Started {
    server: RunningUdpServer,
}

impl Started {
    pub async fn new() -> Self {
        Self::with_hooks(vec![]).await
    }

    pub async fn with_hooks(pre_hooks: Vec<Arc<dyn Hook>>) -> Self {
        let core_config = CoreConfig::default();
        let peer_store = Arc::new(InMemoryPeerStore::new(&core_config));
        let logic = Arc::new(Tracker::new(&core_config, &peer_store, pre_hooks, vec![]));

        let config = UdpTrackerConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            private_key: TEST_PRIVATE_KEY.to_owned(),
            ..Default::default()
        };

        let server = UdpServer::new(config, logic)
            .start()
            .await
            .expect("the test server should start");

        Self { server }
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.server.address()
    }

    pub fn stats_repository(&self) -> Arc<statistics::Repository> {
        self.server.stats_repository()
    }

    pub async fn stop(self) {
        self.server.stop().await.expect("the test server should stop cleanly");
    }
}
