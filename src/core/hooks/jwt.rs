//! A hook that fails an announce unless it carries a valid JSON Web
//! Token.
//!
//! Tokens arrive in the `jwt` extension parameter. They must be RS256
//! JWS with the configured issuer and audience, plus an `infohash`
//! claim that proves access to the requested swarm. Verification keys
//! come from a JWK set endpoint and are rotated in the background: a
//! refresher task periodically fetches the set and atomically swaps the
//! in-memory keys, so announce handling never waits on the network.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use super::Hook;
use crate::core::error::Error as HookError;
use crate::primitives::core::{AnnounceData, AnnounceRequest, RequestContext, ScrapeData, ScrapeRequest};
use crate::primitives::info_hash::InfoHash;
use crate::servers::signals::Halted;

/// Configuration of the JWT hook.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Config {
    /// The required `iss` claim.
    pub issuer: String,

    /// The value the `aud` claim list must contain.
    pub audience: String,

    /// Where to fetch the JWK set from.
    pub jwk_set_url: String,

    /// How often to re-fetch the JWK set.
    #[serde(default = "Config::default_jwk_update_interval")]
    pub jwk_update_interval: Duration,
}

impl Config {
    fn default_jwk_update_interval() -> Duration {
        Duration::from_secs(300)
    }
}

/// Error returned when the hook cannot be built.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to fetch initial JWK set: {source}")]
    InitialFetch {
        #[from]
        source: FetchKeysError,
    },
}

/// Error produced while fetching or decoding a JWK set.
#[derive(Error, Debug)]
pub enum FetchKeysError {
    #[error("JWK set request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    #[error("JWK entry is missing a key id")]
    MissingKeyId,

    #[error("failed to decode the JWK set JSON: {source}")]
    DecodeJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to decode a JWK into a public key: {source}")]
    DecodeKey {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

/// Why a specific token was rejected. Logged, never sent to peers.
#[derive(Error, Debug)]
enum RejectionReason {
    #[error("token does not parse: {source}")]
    Malformed { source: jsonwebtoken::errors::Error },

    #[error("token is not RS256")]
    WrongAlgorithm,

    #[error("token header carries no kid")]
    MissingKeyId,

    #[error("token signed by unknown kid {kid:?}")]
    UnknownKeyId { kid: String },

    #[error("token fails verification: {source}")]
    Verification { source: jsonwebtoken::errors::Error },

    #[error("infohash claim does not match the request")]
    InfoHashClaim,
}

/// The map of known verification keys, indexed by `kid`.
type PublicKeySet = HashMap<String, DecodingKey>;

#[derive(Deserialize)]
struct Claims {
    infohash: String,
}

/// The JWT hook.
pub struct JwtHook {
    config: Config,

    /// Readers snapshot the inner [`Arc`]; the refresher replaces it
    /// wholesale, so a verification in flight keeps the set it started
    /// with.
    public_keys: Arc<RwLock<Arc<PublicKeySet>>>,

    tx_halt: Mutex<Option<oneshot::Sender<Halted>>>,
}

impl JwtHook {
    /// Builds the hook, performing the initial JWK set fetch and
    /// starting the refresher task.
    ///
    /// # Errors
    ///
    /// Fails when the initial JWK set cannot be fetched or decoded; the
    /// hook is not allowed to start without keys.
    pub async fn new(config: Config) -> Result<Arc<Self>, BuildError> {
        let client = reqwest::Client::new();

        let initial_keys = fetch_keys(&client, &config.jwk_set_url).await?;
        tracing::debug!(keys = initial_keys.len(), "fetched initial JWK set");

        let public_keys = Arc::new(RwLock::new(Arc::new(initial_keys)));

        let (tx_halt, rx_halt) = oneshot::channel();

        let hook = Arc::new(Self {
            config,
            public_keys: public_keys.clone(),
            tx_halt: Mutex::new(Some(tx_halt)),
        });

        spawn_refresher(
            client,
            hook.config.jwk_set_url.clone(),
            hook.config.jwk_update_interval,
            public_keys,
            rx_halt,
        );

        Ok(hook)
    }

    /// Stops the background key refresher.
    pub fn stop(&self) {
        if let Some(tx_halt) = self
            .tx_halt
            .lock()
            .expect("the JWT halt-channel lock should not be poisoned")
            .take()
        {
            let _ = tx_halt.send(Halted::Normal);
        }
    }

    fn snapshot(&self) -> Arc<PublicKeySet> {
        self.public_keys
            .read()
            .expect("the JWT key-set lock should not be poisoned")
            .clone()
    }

    fn validate_token(&self, token: &str, info_hash: &InfoHash) -> Result<(), RejectionReason> {
        let header = decode_header(token).map_err(|source| RejectionReason::Malformed { source })?;

        if header.alg != Algorithm::RS256 {
            return Err(RejectionReason::WrongAlgorithm);
        }

        let kid = header.kid.ok_or(RejectionReason::MissingKeyId)?;

        let keys = self.snapshot();
        let key = keys.get(&kid).ok_or(RejectionReason::UnknownKeyId { kid })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);
        // `exp` is honored when present but a token without one is fine
        validation.set_required_spec_claims(&["iss", "aud"]);

        let token_data =
            decode::<Claims>(token, key, &validation).map_err(|source| RejectionReason::Verification { source })?;

        if !claim_matches_info_hash(&token_data.claims.infohash, info_hash) {
            return Err(RejectionReason::InfoHashClaim);
        }

        Ok(())
    }

    #[cfg(test)]
    fn with_key_set(config: Config, keys: PublicKeySet) -> Self {
        Self {
            config,
            public_keys: Arc::new(RwLock::new(Arc::new(keys))),
            tx_halt: Mutex::new(None),
        }
    }
}

impl Hook for JwtHook {
    fn handle_announce<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        req: &'a AnnounceRequest,
        _resp: &'a mut AnnounceData,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        async move {
            let Some(params) = &req.params else {
                return Err(HookError::client("missing jwt"));
            };

            let Some(token) = params.get("jwt") else {
                return Err(HookError::client("missing jwt"));
            };

            if let Err(reason) = self.validate_token(token, &req.info_hash) {
                tracing::debug!(%reason, info_hash = %req.info_hash, "rejected announce");
                return Err(HookError::client("invalid jwt"));
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
        // Scrapes require no token.
        async move { Ok(()) }.boxed()
    }
}

fn spawn_refresher(
    client: reqwest::Client,
    jwk_set_url: String,
    period: Duration,
    public_keys: Arc<RwLock<Arc<PublicKeySet>>>,
    mut rx_halt: oneshot::Receiver<Halted>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            tokio::select! {
                halted = &mut rx_halt => {
                    tracing::info!("Stopping JWK refresher: {halted:?}");
                    break;
                }
                _ = interval.tick() => {
                    match fetch_keys(&client, &jwk_set_url).await {
                        Ok(keys) => {
                            tracing::debug!(keys = keys.len(), "refreshed JWK set");
                            *public_keys
                                .write()
                                .expect("the JWT key-set lock should not be poisoned") = Arc::new(keys);
                        }
                        // keep serving with the previous key set
                        Err(error) => tracing::error!(%error, "failed to refresh JWK set"),
                    }
                }
            }
        }
    });
}

async fn fetch_keys(client: &reqwest::Client, jwk_set_url: &str) -> Result<PublicKeySet, FetchKeysError> {
    let body = client
        .get(jwk_set_url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let jwk_set: JwkSet = serde_json::from_slice(&body)?;

    let mut keys = PublicKeySet::new();

    for jwk in &jwk_set.keys {
        let kid = jwk.common.key_id.clone().ok_or(FetchKeysError::MissingKeyId)?;
        keys.insert(kid, DecodingKey::from_jwk(jwk)?);
    }

    Ok(keys)
}

/// Compares the `infohash` claim against the request's info-hash, both
/// as raw bytes and after URL-decoding (tokens are sometimes issued
/// against the URL-encoded form).
fn claim_matches_info_hash(claim: &str, info_hash: &InfoHash) -> bool {
    if claim.len() == 20 && claim.as_bytes() == info_hash.bytes() {
        return true;
    }

    let decoded: Vec<u8> = percent_decode_str(claim).collect();

    decoded.as_slice() == info_hash.bytes()
}
