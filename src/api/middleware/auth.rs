use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::{api::state::AppState, auth::IdentityClaims, error::AppError};

/// Identity of the authenticated caller, inserted as a request extension by
/// `require_user`.
#[derive(Clone)]
pub struct AuthUser {
    pub claims: IdentityClaims,
}

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthenticated)?;

    let claims = state.token_verifier.verify(token).await?;

    request.extensions_mut().insert(AuthUser { claims });

    Ok(next.run(request).await)
}

/// Admin auth is a static shared secret, checked against the `admin-key`
/// header or an `adminKey` query parameter. Kept as-is from the original
/// design rather than upgraded to per-user role claims; the compare is
/// constant-time so the key can't be probed byte by byte.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get("admin-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_param(request.uri().query(), "adminKey"));

    let provided = provided.ok_or(AppError::Unauthenticated)?;

    if !keys_match(&provided, &state.settings.admin.api_key) {
        return Err(AppError::Unauthenticated);
    }

    Ok(next.run(request).await)
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == name {
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_requires_exact_value() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "secret2"));
        assert!(!keys_match("", "secret"));
    }

    #[test]
    fn query_param_extracts_and_decodes() {
        assert_eq!(
            query_param(Some("adminKey=top%20secret&x=1"), "adminKey").as_deref(),
            Some("top secret")
        );
        assert_eq!(query_param(Some("x=1"), "adminKey"), None);
        assert_eq!(query_param(None, "adminKey"), None);
    }
}
