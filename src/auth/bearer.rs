use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::AuthError;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The header must be present, use the Bearer scheme (case-insensitive),
/// and carry exactly one token value. Each shape violation maps to its
/// own error so the response code tells the caller what to fix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = raw.split_whitespace();

    let scheme = parts.next().ok_or(AuthError::InvalidHeaderScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeaderScheme);
    }

    let token = parts.next().ok_or(AuthError::MalformedHeader)?;
    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let headers = headers_with("bearer tok");
        assert_eq!(extract_bearer_token(&headers), Ok("tok"));
        let headers = headers_with("BEARER tok");
        assert_eq!(extract_bearer_token(&headers), Ok("tok"));
    }

    #[test]
    fn missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingAuthHeader)
        );
    }

    #[test]
    fn wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidHeaderScheme)
        );
    }

    #[test]
    fn scheme_without_token() {
        let headers = headers_with("Bearer");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn too_many_parts() {
        let headers = headers_with("Bearer one two");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn empty_header_value() {
        let headers = headers_with("");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidHeaderScheme)
        );
    }
}
