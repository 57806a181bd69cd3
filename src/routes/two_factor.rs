//! TOTP lifecycle for the signed-in user:
//! no secret -> provisioned (setup) -> enabled (verify) -> cleared (disable).

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::totp::Provisioning;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::state::{AppState, SharedState};

#[derive(Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub enabled: bool,
    pub provisioned: bool,
}

#[derive(Serialize)]
pub struct SetupResponse {
    #[serde(flatten)]
    pub provisioning: Provisioning,
    pub manual_entry_key: String,
    /// False when an existing secret was returned.
    pub created: bool,
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub enabled: bool,
    pub message: String,
}

async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Decrypt the stored secret; a user without one has not set 2FA up.
pub(crate) fn load_secret(state: &AppState, user: &User) -> Result<String, AppError> {
    let sealed = user.totp_secret_enc.as_deref().ok_or_else(|| {
        AppError::BadRequest("Two-factor authentication is not set up".to_string())
    })?;
    state.secrets.open(sealed).map_err(AppError::Internal)
}

pub async fn status(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, AppError> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(StatusResponse {
        enabled: user.two_factor_enabled,
        provisioned: user.totp_secret_enc.is_some(),
    }))
}

/// Hand out the provisioning data, generating a secret on first call.
pub async fn setup(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<SetupResponse>, AppError> {
    let mut user = load_user(&state, &auth).await?;

    let created = if user.totp_secret_enc.is_some() {
        false
    } else {
        let secret = state.authenticator.generate_secret();
        let sealed = state.secrets.seal(&secret).map_err(AppError::Internal)?;
        let stored = db::users::set_totp_secret_if_absent(&state.pool, user.id, &sealed).await?;
        // A concurrent setup may have won; either way the row now holds the one secret.
        user = load_user(&state, &auth).await?;
        stored
    };

    let secret = load_secret(&state, &user)?;
    let provisioning = state
        .authenticator
        .provision(&secret, &user.email)
        .map_err(AppError::Internal)?;

    if created {
        audit::log_event(
            &state.pool,
            Some(user.id),
            "user.2fa_provisioned",
            "user",
            Some(user.id),
            None,
        )
        .await;
        tracing::info!(user_id = %user.id, "TOTP secret provisioned");
    }

    Ok(Json(SetupResponse {
        manual_entry_key: provisioning.secret.clone(),
        provisioning,
        created,
        enabled: user.two_factor_enabled,
    }))
}

/// Confirm a code; the first success enables 2FA. Does not mint a session.
pub async fn verify(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let key = auth.user_id.to_string();
    if state.totp_limiter.check(&key).is_err() {
        tracing::warn!(user_id = %auth.user_id, "2FA rate limit hit");
        return Err(AppError::RateLimited(
            "Too many invalid codes. Please try again later.".to_string(),
        ));
    }

    let user = load_user(&state, &auth).await?;
    let secret = load_secret(&state, &user)?;

    let valid = state
        .authenticator
        .verify(&secret, &req.code)
        .map_err(AppError::Internal)?;
    if !valid {
        state.totp_limiter.record_failure(&key);
        return Err(AppError::BadRequest("Invalid 2FA code".to_string()));
    }
    state.totp_limiter.reset(&key);

    if !user.two_factor_enabled {
        if !db::users::enable_two_factor(&state.pool, user.id).await? {
            // disabled between the read and the write
            return Err(AppError::BadRequest(
                "Two-factor authentication is not set up".to_string(),
            ));
        }

        audit::log_event(
            &state.pool,
            Some(user.id),
            "user.2fa_enabled",
            "user",
            Some(user.id),
            None,
        )
        .await;
        tracing::info!(user_id = %user.id, "Two-factor authentication enabled");
    }

    Ok(Json(VerifyResponse {
        success: true,
        enabled: true,
        message: "2FA code verified".to_string(),
    }))
}

pub async fn disable(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::users::disable_two_factor(&state.pool, auth.user_id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.2fa_disabled",
        "user",
        Some(auth.user_id),
        None,
    )
    .await;
    tracing::info!(user_id = %auth.user_id, "Two-factor authentication disabled");

    Ok(Json(serde_json::json!({ "message": "2FA disabled" })))
}
