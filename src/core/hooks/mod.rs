//! The hook pipeline.
//!
//! A hook is a pluggable processor invoked around every announce and
//! scrape. Hooks run in a fixed, configured order; the first one to
//! return an error short-circuits the chain and its error is surfaced
//! to the client (client-facing errors verbatim, anything else as a
//! generic internal error).
//!
//! Hooks receive the ambient [`RequestContext`], the request, and the
//! response under construction, which they may enrich. They must not
//! perform request-path I/O; the [`jwt`] hook does its network work
//! (key rotation) on a background task instead.
pub mod client_approval;
pub mod jwt;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::error::Error;
use crate::primitives::core::{AnnounceData, AnnounceRequest, RequestContext, ScrapeData, ScrapeRequest};

/// A pre- or post-processor in the announce and scrape pipelines.
pub trait Hook: Sync + Send {
    fn handle_announce<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a AnnounceRequest,
        resp: &'a mut AnnounceData,
    ) -> BoxFuture<'a, Result<(), Error>>;

    fn handle_scrape<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        req: &'a ScrapeRequest,
        resp: &'a mut ScrapeData,
    ) -> BoxFuture<'a, Result<(), Error>>;
}

/// Runs every hook in order over an announce; stops at the first error.
pub async fn run_announce_hooks(
    hooks: &[Arc<dyn Hook>],
    ctx: &mut RequestContext,
    req: &AnnounceRequest,
    resp: &mut AnnounceData,
) -> Result<(), Error> {
    for hook in hooks {
        hook.handle_announce(ctx, req, resp).await?;
    }
    Ok(())
}

/// Runs every hook in order over a scrape; stops at the first error.
pub async fn run_scrape_hooks(
    hooks: &[Arc<dyn Hook>],
    ctx: &mut RequestContext,
    req: &ScrapeRequest,
    resp: &mut ScrapeData,
) -> Result<(), Error> {
    for hook in hooks {
        hook.handle_scrape(ctx, req, resp).await?;
    }
    Ok(())
}
