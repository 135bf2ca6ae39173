//! The accept loop.
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::instrument;

use super::bound_socket::BoundSocket;
use super::buffer_pool::BufferPool;
use super::processor::Processor;
use crate::servers::signals::Halted;
use crate::servers::udp::{RawRequest, UDP_TRACKER_LOG_TARGET};

/// How long one socket read may block before the loop checks the halt
/// channel again.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// The UDP server accept loop: reads datagrams into pooled buffers and
/// spawns one handler task per packet.
pub struct Launcher;

impl Launcher {
    /// Runs until halted or until the socket fails fatally, then waits
    /// for every in-flight handler before returning.
    #[instrument(skip(socket, buffer_pool, processor, rx_halt))]
    pub(crate) async fn run(
        socket: Arc<BoundSocket>,
        buffer_pool: Arc<BufferPool>,
        processor: Processor,
        mut rx_halt: oneshot::Receiver<Halted>,
    ) {
        let local_addr = socket.address();
        let mut in_flight = JoinSet::new();

        loop {
            match rx_halt.try_recv() {
                Err(oneshot::error::TryRecvError::Empty) => {}
                _ => {
                    tracing::info!(target: UDP_TRACKER_LOG_TARGET, %local_addr, "halting");
                    break;
                }
            }

            let mut buffer = buffer_pool.take();

            match timeout(READ_TIMEOUT, socket.recv_buf_from(&mut buffer)).await {
                // deadline tick: go observe the halt channel
                Err(_elapsed) => buffer_pool.give_back(buffer),

                Ok(Err(error)) => {
                    buffer_pool.give_back(buffer);

                    if is_transient(&error) {
                        tracing::warn!(target: UDP_TRACKER_LOG_TARGET, %local_addr, %error, "transient receive error");
                        continue;
                    }

                    tracing::error!(target: UDP_TRACKER_LOG_TARGET, %local_addr, %error, "fatal receive error, stopping");
                    break;
                }

                Ok(Ok(from)) => {
                    if buffer.is_empty() {
                        buffer_pool.give_back(buffer);
                        continue;
                    }

                    let request = RawRequest { payload: buffer, from };

                    in_flight.spawn(processor.clone().process_request(request));

                    // reap whatever already finished
                    while in_flight.try_join_next().is_some() {}
                }
            }
        }

        // drain in-flight handlers before reporting shutdown complete
        while in_flight.join_next().await.is_some() {}

        tracing::info!(target: UDP_TRACKER_LOG_TARGET, %local_addr, "stopped");
    }
}

/// Receive errors that do not invalidate the socket. `ConnectionReset`
/// is how some platforms report an ICMP port-unreachable for an earlier
/// send.
fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::ConnectionReset
    )
}
