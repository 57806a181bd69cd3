use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{ACCESS_COOKIE, AuthUser, ChallengeUser};
use crate::auth::jwt::{Claims, Lifetime, encode_token};
use crate::auth::password;
use crate::config::RegistrationMode;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::models::user::{ROLE_ADMIN, ROLE_WORKER};
use crate::routes::two_factor::load_secret;
use crate::state::SharedState;
use crate::validate;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize)]
pub struct SecondFactorRequest {
    pub code: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub requires_2fa: bool,
    pub challenge_token: String,
    pub expires_at: DateTime<Utc>,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn session_cookie(token: &str, lifetime: Lifetime) -> CookieJar {
    let cookie = Cookie::build((ACCESS_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(lifetime.duration().num_seconds()))
        .build();
    CookieJar::new().add(cookie)
}

fn clear_session_cookie() -> CookieJar {
    let cookie = Cookie::build((ACCESS_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

fn expiry_of(claims: &Claims) -> DateTime<Utc> {
    DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now)
}

/// Mint a full session for a user who has passed every required factor.
async fn start_session(
    state: &SharedState,
    mut user: User,
    lifetime: Lifetime,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let claims = Claims::session(user.id, &user.email, &user.role, lifetime);
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let now = Utc::now();
    db::users::touch_last_login(&state.pool, user.id, now).await?;
    user.last_login_at = Some(now);

    audit::log_event(&state.pool, Some(user.id), "user.login", "user", Some(user.id), None).await;
    tracing::info!(user_id = %user.id, "Session started");

    let jar = session_cookie(&token, lifetime);
    Ok((
        jar,
        Json(AuthResponse {
            token,
            token_type: "Bearer",
            expires_at: expiry_of(&claims),
            user,
        }),
    ))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = validate::required("email", &req.email)?;
    let name = validate::required("name", &req.name)?;
    validate::email(email)?;
    validate::password(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock keeps two concurrent first registrations from both becoming admin
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let role = if db::users::count_all(&mut *tx).await? == 0 {
        ROLE_ADMIN
    } else if state.config.registration == RegistrationMode::Open {
        ROLE_WORKER
    } else {
        return Err(AppError::Forbidden(
            "Registration is disabled. Ask an administrator for an account.".to_string(),
        ));
    };

    let user = db::users::create(&mut *tx, email, &pw_hash, name, role, true)
        .await
        .map_err(|e| {
            AppError::conflict_on_constraint(e, "An account with this email already exists")
        })?;

    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.registered",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "role": role })),
    )
    .await;

    start_session(&state, user, Lifetime::Standard).await
}

/// Password step. Accounts with 2FA enabled get a challenge token (202)
/// instead of a session.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if let Err(retry_after) = state.login_limiter.check(email) {
        tracing::warn!(retry_after, "Login rate limit hit");
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, email).await? else {
        password::verify_decoy(&req.password);
        state.login_limiter.record_failure(email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(email);
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    state.login_limiter.reset(email);

    if user.requires_second_factor() {
        let claims = Claims::challenge(user.id, &user.email, &user.role);
        let challenge_token =
            encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

        tracing::info!(user_id = %user.id, "Password accepted, second factor required");
        return Ok((
            StatusCode::ACCEPTED,
            Json(ChallengeResponse {
                requires_2fa: true,
                challenge_token,
                expires_at: expiry_of(&claims),
                message: "Two-factor code required",
            }),
        )
            .into_response());
    }

    let lifetime = if req.remember {
        Lifetime::Extended
    } else {
        Lifetime::Standard
    };
    Ok(start_session(&state, user, lifetime).await?.into_response())
}

/// Second step for 2FA accounts: challenge token + TOTP code -> session.
pub async fn login_second_factor(
    challenge: ChallengeUser,
    State(state): State<SharedState>,
    Json(req): Json<SecondFactorRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let key = challenge.user_id.to_string();
    if state.totp_limiter.check(&key).is_err() {
        tracing::warn!(user_id = %challenge.user_id, "2FA rate limit hit");
        return Err(AppError::RateLimited(
            "Too many invalid codes. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, challenge.user_id)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::Unauthorized("Account not found or inactive".to_string()))?;

    if !user.two_factor_enabled {
        return Err(AppError::Unauthorized(
            "Two-factor authentication is no longer enabled. Log in again.".to_string(),
        ));
    }
    let secret = load_secret(&state, &user)?;

    let valid = state
        .authenticator
        .verify(&secret, &req.code)
        .map_err(AppError::Internal)?;
    if !valid {
        state.totp_limiter.record_failure(&key);
        tracing::warn!(user_id = %user.id, "Invalid 2FA code at login");
        return Err(AppError::BadRequest("Invalid 2FA code".to_string()));
    }
    state.totp_limiter.reset(&key);

    let lifetime = if req.remember {
        Lifetime::Extended
    } else {
        Lifetime::Standard
    };
    start_session(&state, user, lifetime).await
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate::password(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid = password::verify(&req.current_password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.password_changed",
        "user",
        Some(user.id),
        None,
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}
