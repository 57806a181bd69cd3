use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::parameters::ParameterFields;
use crate::error::AppError;
use crate::inspection;
use crate::middleware::audit;
use crate::models::Parameter;
use crate::models::parameter::{KIND_RANGE, KIND_TEXT};
use crate::state::SharedState;
use crate::validate;

#[derive(Deserialize)]
pub struct ParameterRequest {
    pub name: String,
    pub kind: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    pub expected_text: Option<String>,
}

/// Owned column values derived from a request; borrowed into `ParameterFields`.
struct Prepared {
    name: String,
    kind: &'static str,
    min_value: Option<f64>,
    max_value: Option<f64>,
    unit: String,
    expected_text: Option<String>,
    range_label: String,
}

impl Prepared {
    fn fields(&self) -> ParameterFields<'_> {
        ParameterFields {
            name: &self.name,
            kind: self.kind,
            min_value: self.min_value,
            max_value: self.max_value,
            unit: &self.unit,
            expected_text: self.expected_text.as_deref(),
            range_label: &self.range_label,
        }
    }
}

fn prepare(req: &ParameterRequest) -> Result<Prepared, AppError> {
    let name = validate::required("name", &req.name)?.to_string();
    let kind = match req.kind.trim() {
        KIND_RANGE => KIND_RANGE,
        KIND_TEXT => KIND_TEXT,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown parameter kind '{other}' (expected range or text)"
            )));
        }
    };

    // Range parameters ignore expected_text; text parameters ignore bounds and unit.
    let (min_value, max_value, unit, expected_text) = if kind == KIND_RANGE {
        (req.min_value, req.max_value, req.unit.trim().to_string(), None)
    } else {
        (
            None,
            None,
            String::new(),
            validate::optional(req.expected_text.as_deref()).map(str::to_string),
        )
    };

    inspection::check_definition(kind, min_value, max_value).map_err(AppError::BadRequest)?;
    let range_label =
        inspection::range_label(kind, min_value, max_value, &unit, expected_text.as_deref());

    Ok(Prepared {
        name,
        kind,
        min_value,
        max_value,
        unit,
        expected_text,
        range_label,
    })
}

pub async fn list_by_product(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<Parameter>>, AppError> {
    db::products::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let parameters = db::parameters::list_by_product(&state.pool, product_id).await?;
    Ok(Json(parameters))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Parameter>, AppError> {
    let parameter = db::parameters::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Parameter not found".to_string()))?;
    Ok(Json(parameter))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<ParameterRequest>,
) -> Result<Json<Parameter>, AppError> {
    auth.require_admin()?;
    let prepared = prepare(&req)?;

    db::products::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let parameter = db::parameters::create(&state.pool, product_id, &prepared.fields())
        .await
        .map_err(|e| {
            AppError::conflict_on_constraint(e, "This product already has a parameter with that name")
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "parameter.created",
        "parameter",
        Some(parameter.id),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(Json(parameter))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ParameterRequest>,
) -> Result<Json<Parameter>, AppError> {
    auth.require_admin()?;
    let prepared = prepare(&req)?;

    let parameter = db::parameters::update(&state.pool, id, &prepared.fields())
        .await
        .map_err(|e| {
            AppError::conflict_on_constraint(e, "This product already has a parameter with that name")
        })?
        .ok_or_else(|| AppError::NotFound("Parameter not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "parameter.updated",
        "parameter",
        Some(parameter.id),
        None,
    )
    .await;

    Ok(Json(parameter))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if !db::parameters::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Parameter not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "parameter.deleted",
        "parameter",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
