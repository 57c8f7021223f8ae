use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState};

/// Caller identity resolved from a bearer token that is still the user's live session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Not authorized".into())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            unauthorized()
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(unauthorized)?;

        // logout or a newer login retires older tokens
        if user.session_token.as_deref() != Some(token) {
            warn!(user_id = %user.id, "token is not the live session");
            return Err(unauthorized());
        }

        Ok(AuthUser { id: user.id })
    }
}
