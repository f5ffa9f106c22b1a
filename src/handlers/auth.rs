use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Redirect;
use serde::{Deserialize, Serialize};

use crate::auth::TokenVerifier;
use crate::config::{Auth0Config, AuthStrategy};
use crate::crypto::{hash_password, verify_password};
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::models::{LoginRequest, RegisterUser};

fn validate_register(input: &RegisterUser) -> Result<()> {
    for (field, value) in [
        ("username", &input.username),
        ("email", &input.email),
        ("password", &input.password),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("'{}' must not be empty", field)));
        }
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    validate_register(&input)?;

    let conn = state.db.get()?;

    // Pre-checks give distinct messages; the UNIQUE constraints still
    // back them up against races.
    if queries::get_user_by_username(&conn, &input.username)?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }
    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let password_hash = hash_password(&input.password)?;
    queries::create_user(&conn, &input.username, &input.email, &password_hash, false)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User created successfully" })),
    ))
}

/// Local-strategy login: verify credentials, return an HS256 access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let TokenVerifier::Local(local) = state.verifier.as_ref() else {
        return Err(AppError::NotFound("Not found".into()));
    };

    let conn = state.db.get()?;
    let user = queries::get_user_by_username(&conn, &input.username)?;

    // Same response for unknown user and bad password.
    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    };
    if !verify_password(&input.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let access_token = local.issue(&user.username)?;
    Ok(Json(serde_json::json!({ "access_token": access_token })))
}

fn auth0_client(auth0: &Auth0Config) -> Result<(&str, &str)> {
    let client_id = auth0
        .client_id
        .as_deref()
        .ok_or_else(|| AppError::Internal("AUTH0_CLIENT_ID not configured".into()))?;
    let client_secret = auth0
        .client_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal("AUTH0_CLIENT_SECRET not configured".into()))?;
    Ok((client_id, client_secret))
}

/// Auth0-strategy login: redirect the browser into the provider's
/// authorization-code flow.
pub async fn login_redirect(State(state): State<AppState>) -> Result<Redirect> {
    if state.auth_strategy != AuthStrategy::Auth0 {
        return Err(AppError::NotFound("Not found".into()));
    }
    let auth0 = state
        .auth0
        .as_ref()
        .ok_or_else(|| AppError::Internal("Auth0 not configured".into()))?;
    let (client_id, _) = auth0_client(auth0)?;

    let redirect_uri = format!("{}/auth/callback", state.base_url);
    let url = format!(
        "https://{}/authorize?response_type=code&client_id={}&redirect_uri={}&audience={}&scope=openid%20profile%20email",
        auth0.domain,
        urlencoding::encode(client_id),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(&auth0.audience),
    );

    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Exchange the authorization code at the provider's token endpoint and
/// hand the token response straight back to the caller.
pub async fn auth0_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<serde_json::Value>> {
    if state.auth_strategy != AuthStrategy::Auth0 {
        return Err(AppError::NotFound("Not found".into()));
    }
    let auth0 = state
        .auth0
        .as_ref()
        .ok_or_else(|| AppError::Internal("Auth0 not configured".into()))?;
    let (client_id, client_secret) = auth0_client(auth0)?;

    let redirect_uri = format!("{}/auth/callback", state.base_url);
    let request = CodeExchangeRequest {
        grant_type: "authorization_code",
        client_id,
        client_secret,
        code: &query.code,
        redirect_uri: &redirect_uri,
    };

    // Same timeouts as the JWKS fetch: a stalled provider fails the
    // request instead of hanging it.
    let client = crate::auth::provider_client()
        .map_err(|e| AppError::Internal(format!("http client construction failed: {}", e)))?;

    let response = client
        .post(format!("https://{}/oauth/token", auth0.domain))
        .json(&request)
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("token endpoint unreachable: {}", e)))?;

    if !response.status().is_success() {
        tracing::warn!("authorization-code exchange rejected: {}", response.status());
        return Err(AppError::Unauthorized(
            "Authorization code exchange failed".into(),
        ));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Internal(format!("token endpoint response unparseable: {}", e)))?;

    Ok(Json(body))
}
