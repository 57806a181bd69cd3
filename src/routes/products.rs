use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Product;
use crate::state::SharedState;
use crate::validate;

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = db::products::list(&state.pool).await?;
    Ok(Json(products))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    auth.require_admin()?;
    let name = validate::required("name", &req.name)?;

    let product = db::products::create(
        &state.pool,
        name,
        validate::optional(req.code.as_deref()),
        validate::optional(req.description.as_deref()),
    )
    .await
    .map_err(|e| AppError::conflict_on_constraint(e, "A product with this name already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "product.created",
        "product",
        Some(product.id),
        None,
    )
    .await;

    Ok(Json(product))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    auth.require_admin()?;
    let name = validate::required("name", &req.name)?;

    let product = db::products::update(
        &state.pool,
        id,
        name,
        validate::optional(req.code.as_deref()),
        validate::optional(req.description.as_deref()),
    )
    .await
    .map_err(|e| AppError::conflict_on_constraint(e, "A product with this name already exists"))?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "product.updated",
        "product",
        Some(product.id),
        None,
    )
    .await;

    Ok(Json(product))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    let deleted = db::products::delete(&state.pool, id).await.map_err(|e| {
        AppError::conflict_on_constraint(e, "Product has quality records and cannot be deleted")
    })?;
    if !deleted {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "product.deleted",
        "product",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
