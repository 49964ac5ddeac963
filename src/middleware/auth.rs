use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::warn;

use crate::{
    config::startup::AppState,
    error::{AppError, JwtError},
    models::UserId,
    utils::jwt::caller_from_token,
};

/// The caller's identity when a bearer token was sent.
/// A token that is present but does not verify is still a 401.
pub struct Caller(pub Option<UserId>);

/// Same as [`Caller`], but a missing token is a 401 as well.
pub struct AuthUser(pub UserId);

fn identify(parts: &Parts) -> Result<Option<UserId>, AppError> {
    if !parts.headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    let bearer = parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(JwtError::InvalidTokenFormat)?;

    let state = parts
        .extensions
        .get::<AppState>()
        .ok_or(AppError::Internal("application state is not mounted"))?;

    caller_from_token(bearer.token(), state.settings.jwt_secret.as_bytes())
        .map(Some)
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::InvalidToken(e)
        })
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identify(parts).map(Caller)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identify(parts)?
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}
