//! A hook that allows or denies announces by `BitTorrent` client id.
//!
//! The client id is the 6-byte vendor/version prefix of the peer id. A
//! non-empty whitelist only admits listed clients; the blacklist then
//! rejects listed clients. Scrapes carry no peer id and always pass.
use std::collections::HashSet;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Hook;
use crate::core::error::Error as HookError;
use crate::primitives::core::{AnnounceData, AnnounceRequest, RequestContext, ScrapeData, ScrapeRequest};
use crate::primitives::peer::ClientId;

/// Configuration of the client-approval hook. List entries are the
/// literal 6-byte client prefixes, e.g. `"-qB450"`.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub blacklist: Vec<String>,
}

/// Error returned when the hook configuration is unusable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("client id {value:?} must be exactly 6 bytes")]
    InvalidClientId { value: String },
}

/// The client-approval hook.
pub struct ClientApprovalHook {
    approved: HashSet<ClientId>,
    unapproved: HashSet<ClientId>,
}

impl ClientApprovalHook {
    /// Builds the hook from its configuration.
    ///
    /// # Errors
    ///
    /// Fails if any list entry is not exactly 6 bytes long.
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        Ok(Self {
            approved: parse_client_ids(&config.whitelist)?,
            unapproved: parse_client_ids(&config.blacklist)?,
        })
    }
}

fn parse_client_ids(entries: &[String]) -> Result<HashSet<ClientId>, BuildError> {
    entries
        .iter()
        .map(|entry| {
            ClientId::try_from(entry.as_bytes()).map_err(|_| BuildError::InvalidClientId { value: entry.clone() })
        })
        .collect()
}

impl Hook for ClientApprovalHook {
    fn handle_announce<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        req: &'a AnnounceRequest,
        _resp: &'a mut AnnounceData,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        async move {
            let client_id = req.peer.peer_id.client_id();

            if !self.approved.is_empty() && !self.approved.contains(&client_id) {
                return Err(HookError::client("unapproved client"));
            }

            if self.unapproved.contains(&client_id) {
                return Err(HookError::client("unapproved client"));
            }

            Ok(())
        }
        .boxed()
    }

    fn handle_scrape<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        _req: &'a ScrapeRequest,
        _resp: &'a mut ScrapeData,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        // Scrapes carry no peer id; nothing to check.
        async move { Ok(()) }.boxed()
    }
}
