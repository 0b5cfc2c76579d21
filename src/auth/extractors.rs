use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;

use super::claims::{Claims, TokenKind};
use super::dto::JwtKeys;

/// Signed-in identity, passed explicitly to every catalog operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
}

impl From<Claims> for Session {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            display_name: c.name,
            email: c.email,
        }
    }
}

/// Session when a bearer token is present, `None` for anonymous callers.
/// A present but invalid token is still rejected.
pub struct MaybeSession(pub Option<Session>);

fn session_from_parts(
    parts: &Parts,
    keys: &JwtKeys,
) -> Result<Option<Session>, (StatusCode, String)> {
    // Read Authorization header
    let Some(auth) = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    // Expect "Bearer <token>"
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        (StatusCode::UNAUTHORIZED, "invalid or expired token".to_string())
    })?;

    if claims.kind != TokenKind::Access {
        return Err((StatusCode::UNAUTHORIZED, "access token required".to_string()));
    }

    Ok(Some(Session::from(claims)))
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        session_from_parts(parts, &keys)?.ok_or((
            StatusCode::UNAUTHORIZED,
            "missing Authorization header".to_string(),
        ))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(MaybeSession(session_from_parts(parts, &keys)?))
    }
}
