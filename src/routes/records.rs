use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::records::{NewReading, NewRecord, RecordFilter, RecordHeader};
use crate::error::AppError;
use crate::inspection;
use crate::middleware::audit;
use crate::models::{Parameter, QualityRecord, RecordDetail};
use crate::state::SharedState;
use crate::validate;

#[derive(Deserialize)]
pub struct ListParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub product_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ReadingInput {
    pub parameter_id: Uuid,
    pub value: Option<f64>,
    pub text: Option<String>,
    pub observation: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateRecord {
    pub product_id: Uuid,
    pub lot: String,
    pub guide: Option<String>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub verified_by: Option<String>,
    #[serde(default)]
    pub readings: Vec<ReadingInput>,
}

#[derive(Deserialize)]
pub struct UpdateRecord {
    pub lot: String,
    pub guide: Option<String>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub verified_by: Option<String>,
}

/// Inclusive calendar dates -> `[from, until)` timestamps.
pub(crate) fn date_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }

    let start = from.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc());
    let until = to
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc());
    Ok((start, until))
}

fn check_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn evaluate_readings(
    inputs: &[ReadingInput],
    parameters: &[Parameter],
) -> Result<Vec<NewReading>, AppError> {
    let by_id: HashMap<Uuid, &Parameter> = parameters.iter().map(|p| (p.id, p)).collect();
    let mut seen = HashSet::new();

    inputs
        .iter()
        .map(|input| {
            let parameter = by_id.get(&input.parameter_id).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Parameter {} does not belong to this product",
                    input.parameter_id
                ))
            })?;
            if !seen.insert(input.parameter_id) {
                return Err(AppError::BadRequest(format!(
                    "Parameter '{}' was read more than once",
                    parameter.name
                )));
            }

            let text = validate::optional(input.text.as_deref());
            let evaluation = inspection::evaluate(parameter, input.value, text)
                .map_err(AppError::BadRequest)?;

            Ok(NewReading {
                parameter_id: parameter.id,
                parameter_name: parameter.name.clone(),
                range_label: parameter.range_label.clone(),
                value: if parameter.is_range() { input.value } else { None },
                text_value: if parameter.is_range() {
                    None
                } else {
                    text.map(str::to_string)
                },
                observation: validate::optional(input.observation.as_deref()).map(str::to_string),
                out_of_range: evaluation.out_of_range,
                alert: evaluation.alert,
            })
        })
        .collect()
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<QualityRecord>>, AppError> {
    let (from, until) = date_window(params.from, params.to)?;
    let filter = RecordFilter {
        from,
        until,
        product_id: params.product_id,
    };

    let records = db::records::list(&state.pool, &filter).await?;
    Ok(Json(records))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordDetail>, AppError> {
    let record = db::records::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;
    let readings = db::records::readings_for(&state.pool, id).await?;
    Ok(Json(RecordDetail::new(record, readings)))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateRecord>,
) -> Result<Json<RecordDetail>, AppError> {
    let lot = validate::required("lot", &req.lot)?;
    check_quantity(req.quantity)?;

    let inspector = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let mut tx = state.pool.begin().await?;

    let product = db::products::find_by_id(&mut *tx, req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    let parameters = db::parameters::list_by_product(&mut *tx, product.id).await?;
    let readings = evaluate_readings(&req.readings, &parameters)?;

    let new_record = NewRecord {
        product_id: product.id,
        product_name: &product.name,
        user_id: inspector.id,
        user_name: &inspector.name,
        lot,
        guide: validate::optional(req.guide.as_deref()),
        quantity: req.quantity,
        notes: validate::optional(req.notes.as_deref()),
        verified_by: validate::optional(req.verified_by.as_deref()),
    };
    let (record, stored) = db::records::create(&mut tx, &new_record, &readings).await?;

    tx.commit().await?;

    let detail = RecordDetail::new(record, stored);
    if detail.out_of_range_count > 0 {
        tracing::warn!(
            record_id = %detail.record.id,
            lot = %detail.record.lot,
            count = detail.out_of_range_count,
            "Quality record has out-of-range readings"
        );
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "record.created",
        "record",
        Some(detail.record.id),
        Some(serde_json::json!({
            "product_id": detail.record.product_id,
            "out_of_range": detail.out_of_range_count,
        })),
    )
    .await;

    Ok(Json(detail))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRecord>,
) -> Result<Json<RecordDetail>, AppError> {
    let lot = validate::required("lot", &req.lot)?;
    check_quantity(req.quantity)?;

    let existing = db::records::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;
    auth.require_author_or_admin(existing.user_id, "edit this record")?;

    let header = RecordHeader {
        lot,
        guide: validate::optional(req.guide.as_deref()),
        quantity: req.quantity,
        notes: validate::optional(req.notes.as_deref()),
        verified_by: validate::optional(req.verified_by.as_deref()),
    };

    let record = db::records::update_header(&state.pool, id, &header)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;
    let readings = db::records::readings_for(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "record.updated",
        "record",
        Some(id),
        None,
    )
    .await;

    Ok(Json(RecordDetail::new(record, readings)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = db::records::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;

    auth.require_author_or_admin(record.user_id, "delete this record")?;

    db::records::delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "record.deleted",
        "record",
        Some(id),
        Some(serde_json::json!({ "lot": record.lot })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

#[cfg(test)]
mod tests {
    use super::date_window;
    use chrono::NaiveDate;

    #[test]
    fn window_is_inclusive_of_the_end_date() {
        let from = NaiveDate::from_ymd_opt(2026, 3, 1);
        let to = NaiveDate::from_ymd_opt(2026, 3, 31);
        let (start, until) = date_window(from, to).unwrap();
        assert_eq!(start.unwrap().to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(until.unwrap().to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }

    #[test]
    fn reversed_window_is_rejected() {
        let from = NaiveDate::from_ymd_opt(2026, 3, 2);
        let to = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert!(date_window(from, to).is_err());
    }
}
