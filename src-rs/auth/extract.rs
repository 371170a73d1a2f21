use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::store::UserStore;
use crate::error::ApiError;
use crate::task::UserId;

/// The authenticated caller. Taking this as a handler argument rejects the
/// request with 401 before the handler body runs.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserId);

/// The verified bearer token itself, for routes that act on the session
/// rather than on the user's data.
#[derive(Clone, Debug)]
pub struct SessionToken(pub String);

fn authenticate<S>(parts: &Parts, state: &S) -> Result<(UserId, String), ApiError>
where
    Arc<UserStore>: FromRef<S>,
{
    let token = bearer_token(parts).ok_or(ApiError::MissingToken)?;
    let users = Arc::<UserStore>::from_ref(state);
    match users.verify(token)? {
        Some(user) => Ok((user, token.to_string())),
        None => {
            tracing::debug!("rejected unknown bearer token");
            Err(ApiError::InvalidToken)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<UserStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (user, _) = authenticate(parts, state)?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
    Arc<UserStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (_, token) = authenticate(parts, state)?;
        Ok(SessionToken(token))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
