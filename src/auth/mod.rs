//! Request authentication: bearer-token extraction and the two
//! token-verification strategies (local HS256, Auth0 RS256 via JWKS).

pub mod auth0;
pub mod bearer;
pub mod jwks;
pub mod local;

pub use auth0::Auth0Verifier;
pub use bearer::extract_bearer_token;
pub use jwks::JwksCache;
pub use local::LocalVerifier;

use crate::config::{AuthStrategy, Config};
use crate::error::AuthError;

/// The caller identity established by a successful verification.
///
/// Produced once per request and threaded through request extensions;
/// never re-derived from the raw token downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

/// Token verification strategy, selected once at startup from config.
pub enum TokenVerifier {
    Local(LocalVerifier),
    Auth0(Auth0Verifier),
}

impl TokenVerifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.auth_strategy {
            AuthStrategy::Local => Ok(Self::Local(LocalVerifier::new(
                &config.jwt_secret,
                config.token_ttl_secs,
            ))),
            AuthStrategy::Auth0 => {
                let auth0 = config.auth0.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "AUTH_STRATEGY=auth0 requires AUTH0_DOMAIN and AUTH0_API_AUDIENCE"
                    )
                })?;
                Ok(Self::Auth0(Auth0Verifier::new(
                    auth0,
                    std::time::Duration::from_secs(config.jwks_ttl_secs),
                )?))
            }
        }
    }

    /// Verify a bearer token, yielding exactly one subject or a typed error.
    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        match self {
            Self::Local(v) => v.verify(token),
            Self::Auth0(v) => v.verify(token).await,
        }
    }
}

/// Outbound client for identity-provider calls (JWKS fetch, code
/// exchange). A stalled provider must not hang the request being served.
pub(crate) fn provider_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
}

/// Shared mapping from jsonwebtoken failures to our auth taxonomy.
pub(crate) fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::InvalidClaims,
        _ => AuthError::TokenUnparseable,
    }
}
