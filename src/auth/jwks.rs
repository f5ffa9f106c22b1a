//! Remote signing-key set, fetched from the identity provider's well-known
//! endpoint and cached with a TTL. A `kid` miss forces one refresh before
//! the verifier gives up, so key rotation is picked up without waiting for
//! expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::AuthError;

#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: Option<String>,
    pub alg: Option<String>,
    #[serde(rename = "use")]
    pub usage: Option<String>,
    /// RSA modulus, base64url.
    pub n: Option<String>,
    /// RSA public exponent, base64url.
    pub e: Option<String>,
}

struct CachedKeys {
    fetched_at: Instant,
    keys: Arc<JwkSet>,
}

pub struct JwksCache {
    url: String,
    ttl: Duration,
    client: reqwest::Client,
    cached: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    pub fn new(domain: &str, ttl: Duration) -> anyhow::Result<Self> {
        Self::from_url(format!("https://{}/.well-known/jwks.json", domain), ttl)
    }

    /// Point the cache at an explicit JWKS URL. The domain-based
    /// constructor is the production path; this one lets a key set be
    /// served from anywhere.
    pub fn from_url(url: impl Into<String>, ttl: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            url: url.into(),
            ttl,
            client: super::provider_client()?,
            cached: RwLock::new(None),
        })
    }

    /// Return the cached key set, fetching if absent or past its TTL.
    pub async fn get(&self) -> Result<Arc<JwkSet>, AuthError> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&cached.keys));
                }
            }
        }
        self.refresh().await
    }

    /// Unconditionally re-fetch the key set. Used on a `kid` miss so a
    /// rotated key is found without waiting for the TTL.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, AuthError> {
        let keys = Arc::new(self.fetch().await?);
        let mut guard = self.cached.write().await;
        *guard = Some(CachedKeys {
            fetched_at: Instant::now(),
            keys: Arc::clone(&keys),
        });
        Ok(keys)
    }

    /// Network or parse failure is a verification failure for the request
    /// at hand, never a process-level fault.
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("JWKS fetch failed for {}: {}", self.url, e);
                AuthError::SigningKeyNotFound
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                "JWKS endpoint {} returned {}",
                self.url,
                response.status()
            );
            return Err(AuthError::SigningKeyNotFound);
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            tracing::warn!("JWKS response from {} unparseable: {}", self.url, e);
            AuthError::SigningKeyNotFound
        })?;

        if jwks.keys.is_empty() {
            tracing::warn!("JWKS from {} contains no keys", self.url);
            return Err(AuthError::SigningKeyNotFound);
        }

        Ok(jwks)
    }
}
