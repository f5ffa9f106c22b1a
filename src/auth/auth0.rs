//! Auth0 bearer-token verification: RS256 signature against the tenant's
//! JWKS, plus expiration, audience, and issuer checks.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::jwks::{Jwk, JwksCache};
use super::{map_jwt_error, Identity};
use crate::config::Auth0Config;
use crate::error::AuthError;

/// The claims we require from an Auth0 access token. Audience, issuer, and
/// expiration are enforced by the validation setup; the subject is what we
/// keep.
#[derive(Debug, Deserialize)]
struct Auth0Claims {
    sub: String,
    #[allow(dead_code)]
    exp: u64,
}

pub struct Auth0Verifier {
    jwks: JwksCache,
    audience: String,
    issuer: String,
}

impl Auth0Verifier {
    pub fn new(config: &Auth0Config, jwks_ttl: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            jwks: JwksCache::new(&config.domain, jwks_ttl)?,
            audience: config.audience.clone(),
            issuer: format!("https://{}/", config.domain),
        })
    }

    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        // The unverified header only tells us which key to check against;
        // nothing from it is trusted until the signature holds.
        let header =
            jsonwebtoken::decode_header(token).map_err(|_| AuthError::TokenUnparseable)?;
        let kid = header.kid.ok_or(AuthError::TokenUnparseable)?;

        let keys = self.jwks.get().await?;
        let jwk = match keys.find(&kid) {
            Some(jwk) => jwk.clone(),
            None => {
                // One forced refresh covers key rotation inside the TTL.
                let keys = self.jwks.refresh().await?;
                keys.find(&kid)
                    .cloned()
                    .ok_or(AuthError::SigningKeyNotFound)?
            }
        };

        let decoding_key = decoding_key_for(&jwk)?;
        let validation = self.validation();

        let data = jsonwebtoken::decode::<Auth0Claims>(token, &decoding_key, &validation)
            .map_err(map_jwt_error)?;

        Ok(Identity {
            subject: data.claims.sub,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation
    }
}

fn decoding_key_for(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if jwk.kty != "RSA" {
        return Err(AuthError::SigningKeyNotFound);
    }
    let n = jwk.n.as_deref().ok_or(AuthError::SigningKeyNotFound)?;
    let e = jwk.e.as_deref().ok_or(AuthError::SigningKeyNotFound)?;
    DecodingKey::from_rsa_components(n, e).map_err(|_| AuthError::SigningKeyNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    // A syntactically valid base64url RSA modulus.
    const TEST_MODULUS: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            alg: Some("RS256".to_string()),
            usage: Some("sig".to_string()),
            n: Some(TEST_MODULUS.to_string()),
            e: Some("AQAB".to_string()),
        }
    }

    fn jwks_body(kids: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "keys": kids
                .iter()
                .map(|kid| serde_json::json!({
                    "kty": "RSA",
                    "kid": kid,
                    "use": "sig",
                    "alg": "RS256",
                    "n": TEST_MODULUS,
                    "e": "AQAB",
                }))
                .collect::<Vec<_>>(),
        })
    }

    /// Serve a fixed key set from an ephemeral local listener, counting
    /// how many times it gets fetched.
    async fn serve_jwks(body: serde_json::Value) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let app = axum::Router::new().route(
            "/jwks.json",
            axum::routing::get(move || {
                let counter = Arc::clone(&counter);
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::Json(body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/jwks.json", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (url, hits)
    }

    /// An RS256-shaped token whose header names `kid` but whose signature
    /// is garbage; enough to drive key resolution.
    fn forged_token(kid: &str) -> String {
        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT", "kid": kid });
        let claims = serde_json::json!({
            "sub": "auth0|12345",
            "aud": "test-audience",
            "iss": "https://tenant.example.com/",
            "exp": 9_999_999_999u64,
        });
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string()),
            URL_SAFE_NO_PAD.encode(b"not-a-real-signature"),
        )
    }

    fn verifier_for(jwks_url: &str) -> Auth0Verifier {
        Auth0Verifier {
            jwks: JwksCache::from_url(jwks_url, Duration::from_secs(600)).unwrap(),
            audience: "test-audience".to_string(),
            issuer: "https://tenant.example.com/".to_string(),
        }
    }

    #[tokio::test]
    async fn known_kid_reaches_signature_check() {
        let (url, hits) = serve_jwks(jwks_body(&["key-1"])).await;
        let verifier = verifier_for(&url);

        let err = verifier.verify(&forged_token("key-1")).await.unwrap_err();

        // Key resolution succeeded; what fails is the forged signature.
        assert_eq!(err, AuthError::TokenUnparseable);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_refreshes_once_then_fails() {
        let (url, hits) = serve_jwks(jwks_body(&["key-1"])).await;
        let verifier = verifier_for(&url);

        let err = verifier.verify(&forged_token("key-2")).await.unwrap_err();

        assert_eq!(err, AuthError::SigningKeyNotFound);
        // Initial fetch plus the one forced refresh, nothing more.
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn key_set_is_cached_across_verifications() {
        let (url, hits) = serve_jwks(jwks_body(&["key-1"])).await;
        let verifier = verifier_for(&url);

        let _ = verifier.verify(&forged_token("key-1")).await;
        let _ = verifier.verify(&forged_token("key-1")).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_jwks_endpoint_is_a_verification_failure() {
        // Bind then drop so the port is known-dead.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/jwks.json", listener.local_addr().unwrap());
        drop(listener);

        let verifier = verifier_for(&url);
        let err = verifier.verify(&forged_token("key-1")).await.unwrap_err();
        assert_eq!(err, AuthError::SigningKeyNotFound);
    }

    #[tokio::test]
    async fn token_without_kid_is_unparseable() {
        let (url, hits) = serve_jwks(jwks_body(&["key-1"])).await;
        let verifier = verifier_for(&url);

        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        let token = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(b"{}"),
            URL_SAFE_NO_PAD.encode(b"sig"),
        );

        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::TokenUnparseable);
        // Failed before any key lookup was needed.
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn decoding_key_requires_rsa() {
        let mut jwk = rsa_jwk("key-1");
        jwk.kty = "EC".to_string();
        assert_eq!(
            decoding_key_for(&jwk).err(),
            Some(AuthError::SigningKeyNotFound)
        );
    }

    #[test]
    fn decoding_key_requires_components() {
        let mut jwk = rsa_jwk("key-1");
        jwk.n = None;
        assert_eq!(
            decoding_key_for(&jwk).err(),
            Some(AuthError::SigningKeyNotFound)
        );

        let mut jwk = rsa_jwk("key-1");
        jwk.e = None;
        assert_eq!(
            decoding_key_for(&jwk).err(),
            Some(AuthError::SigningKeyNotFound)
        );
    }

    #[test]
    fn decoding_key_builds_from_components() {
        assert!(decoding_key_for(&rsa_jwk("key-1")).is_ok());
    }
}
