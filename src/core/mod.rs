//! The tracker core.
//!
//! [`Tracker`] is the production implementation of [`TrackerLogic`]: it
//! runs the configured pre-hook pipeline, mutates and queries the peer
//! store, assembles the response, and later runs the post-hook pipeline
//! from the fire-and-forget `after_*` operations.
//!
//! Frontends only ever see the [`TrackerLogic`] trait.
pub mod config;
pub mod error;
pub mod hooks;
pub mod storage;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use self::config::CoreConfig;
use self::error::Error;
use self::hooks::{run_announce_hooks, run_scrape_hooks, Hook};
use self::storage::in_memory::InMemoryPeerStore;
use self::storage::PeerRole;
use crate::primitives::core::{AnnounceData, AnnounceRequest, RequestContext, ScrapeData, ScrapeRequest};
use crate::primitives::AnnounceEvent;

/// What a frontend needs from a tracker.
///
/// `handle_*` runs synchronously within a request handler and produces
/// the response (or an [`Error`], which the frontend translates into a
/// wire error frame). `after_*` is invoked fire-and-forget once the
/// response is on its way; it takes the materialized request and
/// response and must never produce a client-visible failure.
pub trait TrackerLogic: Sync + Send {
    fn handle_announce<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a AnnounceRequest,
    ) -> BoxFuture<'a, Result<AnnounceData, Error>>;

    fn after_announce(&self, req: AnnounceRequest, resp: AnnounceData) -> BoxFuture<'_, ()>;

    fn handle_scrape<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a ScrapeRequest,
    ) -> BoxFuture<'a, Result<ScrapeData, Error>>;

    fn after_scrape(&self, req: ScrapeRequest, resp: ScrapeData) -> BoxFuture<'_, ()>;
}

/// The tracker: hook pipelines around an in-memory peer store.
pub struct Tracker {
    config: CoreConfig,

    /// The in-memory peer store.
    peer_store: Arc<InMemoryPeerStore>,

    /// Hooks run before the peer store is touched; the first error
    /// rejects the request.
    pre_hooks: Vec<Arc<dyn Hook>>,

    /// Hooks run after the response has been sent.
    post_hooks: Vec<Arc<dyn Hook>>,
}

impl Tracker {
    #[must_use]
    pub fn new(
        config: &CoreConfig,
        peer_store: &Arc<InMemoryPeerStore>,
        pre_hooks: Vec<Arc<dyn Hook>>,
        post_hooks: Vec<Arc<dyn Hook>>,
    ) -> Self {
        Self {
            config: config.clone(),
            peer_store: peer_store.clone(),
            pre_hooks,
            post_hooks,
        }
    }

    /// Applies an announce to the swarm and reports whether the
    /// announcing peer is now a seeder.
    fn update_swarm(&self, req: &AnnounceRequest) -> bool {
        match req.event {
            AnnounceEvent::Stopped => {
                self.peer_store
                    .delete(&req.info_hash, &req.peer, PeerRole::from_left(req.left));
            }
            AnnounceEvent::Completed => {
                self.peer_store.graduate_leecher(&req.info_hash, &req.peer);
            }
            AnnounceEvent::None | AnnounceEvent::Started => {
                self.peer_store
                    .put(&req.info_hash, &req.peer, PeerRole::from_left(req.left));
            }
        }

        req.event == AnnounceEvent::Completed || req.left == 0
    }
}

impl TrackerLogic for Tracker {
    fn handle_announce<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a AnnounceRequest,
    ) -> BoxFuture<'a, Result<AnnounceData, Error>> {
        async move {
            let mut resp = AnnounceData {
                interval: self.config.announce_interval,
                min_interval: self.config.min_announce_interval,
                ..Default::default()
            };

            run_announce_hooks(&self.pre_hooks, ctx, req, &mut resp).await?;

            let is_seeder = self.update_swarm(req);

            let stats = self.peer_store.scrape_swarm(&req.info_hash);
            resp.complete = stats.complete;
            resp.incomplete = stats.incomplete;

            if req.event != AnnounceEvent::Stopped {
                let num_want = req.num_want.resolve(self.config.default_num_want) as usize;
                resp.peers = self
                    .peer_store
                    .announce_peers(&req.info_hash, is_seeder, num_want, &req.peer);
            }

            Ok(resp)
        }
        .boxed()
    }

    fn after_announce(&self, req: AnnounceRequest, mut resp: AnnounceData) -> BoxFuture<'_, ()> {
        async move {
            let mut ctx = RequestContext::default();

            if let Err(error) = run_announce_hooks(&self.post_hooks, &mut ctx, &req, &mut resp).await {
                tracing::error!(%error, info_hash = %req.info_hash, "announce post-hook failed");
            }
        }
        .boxed()
    }

    fn handle_scrape<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a ScrapeRequest,
    ) -> BoxFuture<'a, Result<ScrapeData, Error>> {
        async move {
            let mut resp = ScrapeData::empty();

            run_scrape_hooks(&self.pre_hooks, ctx, req, &mut resp).await?;

            for info_hash in &req.info_hashes {
                resp.add_file(self.peer_store.scrape_swarm(info_hash));
            }

            Ok(resp)
        }
        .boxed()
    }

    fn after_scrape(&self, req: ScrapeRequest, mut resp: ScrapeData) -> BoxFuture<'_, ()> {
        async move {
            let mut ctx = RequestContext::default();

            if let Err(error) = run_scrape_hooks(&self.post_hooks, &mut ctx, &req, &mut resp).await {
                tracing::error!(%error, "scrape post-hook failed");
            }
        }
        .boxed()
    }
}
