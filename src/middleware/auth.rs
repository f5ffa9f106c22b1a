use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::extract_bearer_token;
use crate::db::AppState;
use crate::error::Result;

/// Establish the caller's identity before any mutating handler runs.
///
/// On success the verified `Identity` is inserted into request extensions
/// so downstream policy checks never touch the raw token again. Failures
/// surface as 401 with the structured error body.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identity = {
        let token = extract_bearer_token(request.headers())?;
        state.verifier.verify(token).await?
    };

    tracing::debug!(subject = %identity.subject, "authenticated request");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
