//! Handles one datagram from decode to response write.
use std::io::Cursor;
use std::sync::Arc;

use derive_more::Constructor;
use tokio::time::Instant;
use tracing::instrument;

use super::bound_socket::BoundSocket;
use super::buffer_pool::BufferPool;
use crate::core::TrackerLogic;
use crate::servers::udp::config::UdpTrackerConfig;
use crate::servers::udp::connection_cookie::Secret;
use crate::servers::udp::statistics;
use crate::servers::udp::{handlers, RawRequest, UDP_TRACKER_LOG_TARGET};

/// One processor instance is cloned per datagram; all its state is
/// shared behind [`Arc`]s.
#[derive(Constructor, Clone)]
pub struct Processor {
    socket: Arc<BoundSocket>,
    config: Arc<UdpTrackerConfig>,
    secret: Secret,
    logic: Arc<dyn TrackerLogic>,
    stats: Arc<statistics::Repository>,
    buffer_pool: Arc<BufferPool>,
}

impl Processor {
    /// Runs the dispatch state machine for one datagram, records the
    /// latency histogram and writes the response (if any) back on the
    /// shared socket. The receive buffer goes back to the pool on exit.
    #[instrument(skip(self, request))]
    pub async fn process_request(self, request: RawRequest) {
        let from = request.from;

        let start_time = Instant::now();

        let outcome = handlers::handle_packet(&request, &self.config, &self.secret, &self.logic).await;

        let payload = outcome.response.as_ref().and_then(|response| {
            let mut writer = Cursor::new(Vec::with_capacity(200));
            match response.write_bytes(&mut writer) {
                Ok(()) => Some(writer.into_inner()),
                Err(error) => {
                    tracing::error!(target: UDP_TRACKER_LOG_TARGET, %error, "failed to serialize response");
                    None
                }
            }
        });

        // latency covers dispatch entry to serialization complete
        let latency = start_time.elapsed();
        self.stats
            .record_response_duration(outcome.action, &outcome.error, latency)
            .await;

        if let Some(payload) = payload {
            // whether it reaches the peer is not our problem
            match self.socket.send_to(&payload, &from).await {
                Ok(sent_bytes) => {
                    tracing::debug!(target: UDP_TRACKER_LOG_TARGET, %from, %sent_bytes, action = outcome.action, "sent response");
                }
                Err(error) => {
                    tracing::warn!(target: UDP_TRACKER_LOG_TARGET, %from, %error, "failed to send response");
                }
            }
        }

        self.buffer_pool.give_back(request.payload);
    }
}
