//! Owning the socket: server startup and graceful shutdown.
pub mod bound_socket;
pub mod buffer_pool;
pub mod launcher;
pub mod processor;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use self::bound_socket::BoundSocket;
use self::buffer_pool::BufferPool;
use self::launcher::Launcher;
use self::processor::Processor;
use crate::core::TrackerLogic;
use crate::servers::signals::Halted;
use crate::servers::udp::config::UdpTrackerConfig;
use crate::servers::udp::connection_cookie::Secret;
use crate::servers::udp::error::Error;
use crate::servers::udp::{statistics, UDP_TRACKER_LOG_TARGET};

/// A UDP tracker server that has not been started yet.
pub struct UdpServer {
    config: UdpTrackerConfig,
    logic: Arc<dyn TrackerLogic>,
}

impl UdpServer {
    #[must_use]
    pub fn new(config: UdpTrackerConfig, logic: Arc<dyn TrackerLogic>) -> Self {
        Self { config, logic }
    }

    /// Validates the configuration, binds the socket and starts the
    /// accept loop.
    ///
    /// # Errors
    ///
    /// Fails when the private key is too short or the socket cannot be
    /// bound; both are fatal to startup.
    pub async fn start(self) -> Result<RunningUdpServer, Error> {
        let secret = Secret::new(&self.config.private_key)?;

        let socket = Arc::new(BoundSocket::new(self.config.bind_address).await?);
        let address = socket.address();

        let stats = Arc::new(statistics::Repository::new());
        let buffer_pool = Arc::new(BufferPool::new());

        let processor = Processor::new(
            socket.clone(),
            Arc::new(self.config),
            secret,
            self.logic,
            stats.clone(),
            buffer_pool.clone(),
        );

        let (tx_halt, rx_halt) = oneshot::channel();

        let task = tokio::spawn(Launcher::run(socket, buffer_pool, processor, rx_halt));

        tracing::info!(target: UDP_TRACKER_LOG_TARGET, %address, "started");

        Ok(RunningUdpServer {
            address,
            stats,
            tx_halt,
            task,
        })
    }
}

/// A started server. Dropping it aborts nothing: call
/// [`RunningUdpServer::stop`] for a clean shutdown.
pub struct RunningUdpServer {
    address: SocketAddr,
    stats: Arc<statistics::Repository>,
    tx_halt: oneshot::Sender<Halted>,
    task: JoinHandle<()>,
}

impl RunningUdpServer {
    /// The bound address, with the real port when `bind_address` used
    /// port 0.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The response-duration statistics collected by this server.
    #[must_use]
    pub fn stats_repository(&self) -> Arc<statistics::Repository> {
        self.stats.clone()
    }

    /// Signals the accept loop to stop and waits until every in-flight
    /// handler has drained.
    ///
    /// # Errors
    ///
    /// Fails when the server task panicked instead of shutting down.
    pub async fn stop(self) -> Result<(), Error> {
        let _ = self.tx_halt.send(Halted::Normal);

        self.task.await.map_err(|source| Error::ShutdownFailed { source })
    }
}
