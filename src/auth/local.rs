//! Local HS256 tokens: issued at login, verified against a process-held
//! secret. The subject claim is the username.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{map_jwt_error, Identity};
use crate::error::{AppError, AuthError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct LocalClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct LocalVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl_secs: i64,
}

impl LocalVerifier {
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Issue an access token for a successfully authenticated username.
    pub fn issue(&self, subject: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = LocalClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> std::result::Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Local tokens carry no audience claim.
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<LocalClaims>(token, &self.decoding, &validation)
            .map_err(map_jwt_error)?;

        Ok(Identity {
            subject: data.claims.sub,
        })
    }
}
