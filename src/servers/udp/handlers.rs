//! The per-datagram dispatch state machine.
//!
//! Every received packet goes through the same gates: header length
//! (too short means a silent drop), connection-cookie validation for
//! anything but `connect`, then per-action decoding and a call into the
//! [`TrackerLogic`](crate::core::TrackerLogic) collaborator. Errors on
//! the way out become BEP 15 error frames carrying the request's
//! transaction id.
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::config::UdpTrackerConfig;
use super::connection_cookie::{self, Secret, INITIAL_CONNECTION_ID};
use super::error::Error;
use super::request::{
    self, RequestHeader, TransactionId, ANNOUNCE_ACTION_ID, ANNOUNCE_V6_ACTION_ID, CONNECT_ACTION_ID, SCRAPE_ACTION_ID,
};
use super::response::{
    AnnounceResponse, ConnectResponse, ErrorResponse, Response, ScrapeResponse, TorrentScrapeStatistics,
};
use super::{RawRequest, MAX_RESPONSE_PEERS_IPV4, MAX_RESPONSE_PEERS_IPV6, UDP_TRACKER_LOG_TARGET};
use crate::core::error::Error as LogicError;
use crate::core::TrackerLogic;
use crate::primitives::core::{effective_peer_ip, AnnounceRequest, PeersWanted, RequestContext, ScrapeRequest};
use crate::primitives::peer::Peer;
use crate::shared::clock::Time as _;
use crate::CurrentClock;

/// What handling one datagram produced.
#[derive(Debug)]
pub(crate) struct PacketOutcome {
    /// The response to send; `None` is a deliberate silent drop.
    pub response: Option<Response>,
    /// Action label for the response-duration histogram. Empty when the
    /// header never parsed.
    pub action: &'static str,
    /// Error label for the histogram; empty on success.
    pub error: String,
}

impl PacketOutcome {
    fn respond(action: &'static str, response: Response) -> Self {
        Self {
            response: Some(response),
            action,
            error: String::new(),
        }
    }

    fn respond_with_error(action: &'static str, transaction_id: TransactionId, message: String) -> Self {
        Self {
            response: Some(Response::from(ErrorResponse {
                transaction_id,
                message: message.clone(),
            })),
            action,
            error: message,
        }
    }

    fn drop_silently(error: String) -> Self {
        Self {
            response: None,
            action: "",
            error,
        }
    }
}

/// Handles one raw datagram.
#[instrument(fields(request_id), skip(udp_request, config, secret, logic))]
pub(crate) async fn handle_packet(
    udp_request: &RawRequest,
    config: &UdpTrackerConfig,
    secret: &Secret,
    logic: &Arc<dyn TrackerLogic>,
) -> PacketOutcome {
    let request_id = Uuid::new_v4();
    tracing::Span::current().record("request_id", request_id.to_string());

    let source_ip = normalize_source_ip(udp_request.from.ip());

    let Some(header) = RequestHeader::parse(&udp_request.payload) else {
        // no response at all: anything else would make the tracker an
        // amplification reflector for 1-byte datagrams
        tracing::debug!(target: UDP_TRACKER_LOG_TARGET, from = %udp_request.from, "dropping packet shorter than a request header");
        return PacketOutcome::drop_silently(Error::MalformedPacket.to_string());
    };

    if header.action != CONNECT_ACTION_ID {
        if let Err(error) = connection_cookie::check(
            &header.connection_id,
            &source_ip,
            CurrentClock::now(),
            config.max_clock_skew,
            secret,
        ) {
            tracing::debug!(target: UDP_TRACKER_LOG_TARGET, from = %udp_request.from, "rejecting request with a bad connection id");
            return PacketOutcome::respond_with_error(action_label(header.action), header.transaction_id, error.to_string());
        }
    }

    match header.action {
        CONNECT_ACTION_ID => handle_connect(source_ip, &header, secret),
        ANNOUNCE_ACTION_ID | ANNOUNCE_V6_ACTION_ID => {
            handle_announce(
                source_ip,
                &header,
                &udp_request.payload,
                header.action == ANNOUNCE_V6_ACTION_ID,
                config,
                logic,
            )
            .await
        }
        SCRAPE_ACTION_ID => handle_scrape(source_ip, &header, &udp_request.payload, logic).await,
        _ => PacketOutcome::respond_with_error("", header.transaction_id, Error::UnknownAction.to_string()),
    }
}

/// Handles a `connect` request: the connection id field must carry the
/// BEP 15 protocol id, and the response mints a fresh cookie bound to
/// the source address.
fn handle_connect(source_ip: IpAddr, header: &RequestHeader, secret: &Secret) -> PacketOutcome {
    if header.connection_id != INITIAL_CONNECTION_ID {
        return PacketOutcome::respond_with_error("connect", header.transaction_id, Error::MalformedPacket.to_string());
    }

    let connection_id = connection_cookie::make(&source_ip, CurrentClock::now(), secret);

    PacketOutcome::respond(
        "connect",
        Response::from(ConnectResponse {
            transaction_id: header.transaction_id,
            connection_id,
        }),
    )
}

async fn handle_announce(
    source_ip: IpAddr,
    header: &RequestHeader,
    payload: &[u8],
    ipv6: bool,
    config: &UdpTrackerConfig,
    logic: &Arc<dyn TrackerLogic>,
) -> PacketOutcome {
    let wire = match request::parse_announce(payload, ipv6) {
        Ok(wire) => wire,
        Err(error) => {
            return PacketOutcome::respond_with_error("announce", header.transaction_id, error.to_string());
        }
    };

    let peer_ip = effective_peer_ip(source_ip, wire.ip_override, config.allow_ip_spoofing);

    let req = AnnounceRequest {
        info_hash: wire.info_hash,
        peer: Peer::new(wire.peer_id, SocketAddr::new(peer_ip, wire.port)),
        event: wire.event,
        num_want: requested_peers(wire.num_want, ipv6),
        left: wire.left,
        ipv6,
        params: wire.params,
    };

    let mut ctx = RequestContext::default();

    match logic.handle_announce(&mut ctx, &req).await {
        Ok(data) => {
            let response = AnnounceResponse {
                transaction_id: header.transaction_id,
                interval: u32::try_from(data.interval.as_secs()).unwrap_or(u32::MAX),
                leechers: data.incomplete,
                seeders: data.complete,
                ipv6,
                peers: data
                    .peers
                    .iter()
                    .take(max_response_peers(ipv6))
                    .map(|peer| peer.peer_addr)
                    .collect(),
            };

            let logic = logic.clone();
            tokio::spawn(async move { logic.after_announce(req, data).await });

            PacketOutcome::respond("announce", Response::from(response))
        }
        Err(error) => logic_error_outcome("announce", header.transaction_id, &error),
    }
}

async fn handle_scrape(
    source_ip: IpAddr,
    header: &RequestHeader,
    payload: &[u8],
    logic: &Arc<dyn TrackerLogic>,
) -> PacketOutcome {
    let info_hashes = match request::parse_scrape(payload) {
        Ok(info_hashes) => info_hashes,
        Err(error) => {
            return PacketOutcome::respond_with_error("scrape", header.transaction_id, error.to_string());
        }
    };

    let req = ScrapeRequest { info_hashes };

    let mut ctx = RequestContext {
        scrape_is_ipv6: matches!(source_ip, IpAddr::V6(_)),
    };

    match logic.handle_scrape(&mut ctx, &req).await {
        Ok(data) => {
            let response = ScrapeResponse {
                transaction_id: header.transaction_id,
                torrent_stats: data
                    .files
                    .iter()
                    .map(|file| TorrentScrapeStatistics {
                        seeders: file.complete,
                        completed: file.downloaded,
                        leechers: file.incomplete,
                    })
                    .collect(),
            };

            let logic = logic.clone();
            tokio::spawn(async move { logic.after_scrape(req, data).await });

            PacketOutcome::respond("scrape", Response::from(response))
        }
        Err(error) => logic_error_outcome("scrape", header.transaction_id, &error),
    }
}

/// Maps a logic error onto the wire: client-facing messages go out
/// verbatim, anything else becomes a neutral `internal error` and is
/// logged with detail.
fn logic_error_outcome(action: &'static str, transaction_id: TransactionId, error: &LogicError) -> PacketOutcome {
    if error.is_client_facing() {
        PacketOutcome::respond_with_error(action, transaction_id, error.to_string())
    } else {
        tracing::error!(target: UDP_TRACKER_LOG_TARGET, %error, "request failed");
        PacketOutcome::respond_with_error(action, transaction_id, "internal error".to_owned())
    }
}

/// Flattens IPv4-mapped IPv6 source addresses to plain IPv4.
fn normalize_source_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}

/// Translates the wire `numwant`, clamping explicit amounts to what
/// fits a 1500-byte MTU for the request's address family.
fn requested_peers(num_want: i32, ipv6: bool) -> PeersWanted {
    #[allow(clippy::cast_possible_truncation)]
    let cap = max_response_peers(ipv6) as u32;

    match PeersWanted::from(num_want) {
        PeersWanted::Only { amount } => PeersWanted::Only {
            amount: amount.min(cap),
        },
        PeersWanted::Default => PeersWanted::Default,
    }
}

fn max_response_peers(ipv6: bool) -> usize {
    if ipv6 {
        MAX_RESPONSE_PEERS_IPV6
    } else {
        MAX_RESPONSE_PEERS_IPV4
    }
}

fn action_label(action: i32) -> &'static str {
    match action {
        CONNECT_ACTION_ID => "connect",
        ANNOUNCE_ACTION_ID | ANNOUNCE_V6_ACTION_ID => "announce",
        SCRAPE_ACTION_ID => "scrape",
        _ => "",
    }
}
