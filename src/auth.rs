use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the caller's user id. The fronting identity proxy
/// authenticates the request and injects this header; the service itself only
/// reads who the caller is.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// The caller's identity; absent or blank header rejects with 401.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = user_id_from(parts).ok_or(ApiError::Unauthorized)?;
        Ok(Identity { user_id })
    }
}

/// Identity for public endpoints that personalize when they can and serve
/// everyone either way.
#[derive(Debug, Clone, Default)]
pub struct MaybeIdentity(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(user_id_from(parts)))
    }
}
