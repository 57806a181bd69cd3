use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::db::users::UserChanges;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::models::user::ROLE_WORKER;
use crate::state::SharedState;
use crate::validate;

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
    pub password: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    let email = validate::required("email", &req.email)?;
    let name = validate::required("name", &req.name)?;
    validate::email(email)?;
    validate::password(&req.password)?;
    let role = req.role.as_deref().unwrap_or(ROLE_WORKER);
    validate::role(role)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        email,
        &pw_hash,
        name,
        role,
        req.active.unwrap_or(true),
    )
    .await
    .map_err(|e| AppError::conflict_on_constraint(e, "An account with this email already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.created",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "role": role })),
    )
    .await;

    Ok(Json(user))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    let email = req
        .email
        .as_deref()
        .map(|e| validate::required("email", e))
        .transpose()?;
    if let Some(email) = email {
        validate::email(email)?;
    }
    let name = req
        .name
        .as_deref()
        .map(|n| validate::required("name", n))
        .transpose()?;
    if let Some(role) = req.role.as_deref() {
        validate::role(role)?;
    }
    if id == auth.user_id && (req.active == Some(false) || req.role.as_deref() == Some(ROLE_WORKER)) {
        return Err(AppError::BadRequest(
            "You cannot deactivate or demote your own account".to_string(),
        ));
    }

    let pw_hash = match req.password.as_deref() {
        Some(pw) => {
            validate::password(pw)?;
            Some(password::hash(pw).map_err(AppError::Internal)?)
        }
        None => None,
    };

    let changes = UserChanges {
        email,
        name,
        role: req.role.as_deref(),
        active: req.active,
        password_hash: pw_hash.as_deref(),
    };

    let user = db::users::update(&state.pool, id, &changes)
        .await
        .map_err(|e| AppError::conflict_on_constraint(e, "An account with this email already exists"))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.updated",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "password_changed": pw_hash.is_some() })),
    )
    .await;

    Ok(Json(user))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !db::users::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(&state.pool, Some(auth.user_id), "user.deleted", "user", Some(id), None).await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
