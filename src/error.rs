use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication failures raised by the token verifier.
///
/// The wire `code` values match what clients of the original API expect:
/// header-shape problems, unresolvable signing keys, and unparseable tokens
/// all surface as `invalid_header`, while missing-header, expiry, and
/// claim mismatches get their own codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingAuthHeader,
    #[error("Authorization header must start with Bearer")]
    InvalidHeaderScheme,
    #[error("Authorization header must be Bearer token")]
    MalformedHeader,
    #[error("Unable to find appropriate key")]
    SigningKeyNotFound,
    #[error("Token is expired")]
    TokenExpired,
    #[error("Incorrect claims, please check the audience and issuer")]
    InvalidClaims,
    #[error("Unable to parse authentication token")]
    TokenUnparseable,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "authorization_header_missing",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::InvalidHeaderScheme
            | Self::MalformedHeader
            | Self::SigningKeyNotFound
            | Self::TokenUnparseable => "invalid_header",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated caller without permission for the requested mutation.
    #[error("{0}")]
    Forbidden(String),

    /// Login-style failures: bad credentials, failed code exchange.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness violations. The original API reports these as 400.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Auth(e) => (StatusCode::UNAUTHORIZED, e.code(), e.to_string()),
            Self::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", msg.clone())
            }
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, "already_exists", msg.clone()),
            Self::Internal(_) | Self::Db(_) | Self::Pool(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                // Never leak store-layer detail to clients.
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, description) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        let body = axum::Json(serde_json::json!({
            "code": code,
            "description": description,
        }));
        (status, body).into_response()
    }
}
