use std::hash::{Hash, Hasher};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use notes_core::UserId;

use crate::error::AppError;
use crate::routes::AppState;
use crate::token::TokenError;

/// Subject attached to the request by [`require_auth`]; the only scope
/// handlers use for data access.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| AppError::token_invalid("Missing token"))?
        .to_str()
        .map_err(|_| AppError::token_invalid("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::token_invalid("Authorization header must be `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::token_invalid(
            "Authorization scheme must be `Bearer`",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::token_invalid("Bearer token is empty"));
    }

    Ok(token)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    let user_id = state.tokens.verify(token).map_err(|error| {
        tracing::warn!(path = %request.uri().path(), %error, "Rejected bearer token");
        match error {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Invalid | TokenError::Signing(_) => AppError::token_invalid("Invalid token"),
        }
    })?;
    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

/// Stable, non-reversible identifier for log lines.
pub fn user_fingerprint(user_id: &UserId) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    user_id.hash(&mut hasher);
    hasher.finish()
}
