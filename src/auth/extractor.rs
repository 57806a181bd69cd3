use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::CookieJar;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt::{self, Claims, SessionKind};
use crate::error::AppError;
use crate::models::user::ROLE_ADMIN;
use crate::state::SharedState;

pub const ACCESS_COOKIE: &str = "access_token";

/// Caller holding a full session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Changes to a record and its photos are limited to its author and admins.
    pub fn require_author_or_admin(
        &self,
        author: Option<Uuid>,
        what: &str,
    ) -> Result<(), AppError> {
        if self.is_admin() || author == Some(self.user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Only the author or an admin can {what}"
            )))
        }
    }
}

/// Caller that passed the password step of an account with 2FA enabled
/// and still owes a TOTP code.
#[derive(Debug, Clone)]
pub struct ChallengeUser {
    pub user_id: Uuid,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ACCESS_COOKIE)
                    .map(|c| c.value().to_string())
            })
            .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = decode(&token, state, SessionKind::Full)?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

impl FromRequestParts<SharedState> for ChallengeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?
            .ok_or_else(|| AppError::Unauthorized("Missing challenge token".to_string()))?;

        let claims = decode(&token, state, SessionKind::MfaChallenge)?;

        Ok(ChallengeUser {
            user_id: claims.sub,
        })
    }
}

/// `None` when no Authorization header is present; a malformed or non-Bearer
/// header is rejected rather than falling through to the cookie.
async fn bearer_token(parts: &mut Parts, state: &SharedState) -> Result<Option<String>, AppError> {
    if !parts.headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    Ok(Some(bearer.token().to_string()))
}

fn decode(token: &str, state: &SharedState, expected: SessionKind) -> Result<Claims, AppError> {
    let claims = jwt::decode_token(token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    if claims.kind != expected {
        return Err(AppError::Unauthorized(
            "Token not valid for this operation".to_string(),
        ));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ROLE_WORKER;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::now_v7(),
            email: "qa@test.com".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn author_or_admin_may_change_a_record() {
        let author = user(ROLE_WORKER);
        let other = user(ROLE_WORKER);
        let admin = user(ROLE_ADMIN);

        assert!(author.require_author_or_admin(Some(author.user_id), "edit").is_ok());
        assert!(admin.require_author_or_admin(Some(author.user_id), "edit").is_ok());
        assert!(matches!(
            other.require_author_or_admin(Some(author.user_id), "edit"),
            Err(AppError::Forbidden(_))
        ));
        // Records whose author was deleted belong to admins only
        assert!(other.require_author_or_admin(None, "edit").is_err());
        assert!(admin.require_author_or_admin(None, "edit").is_ok());
    }
}
