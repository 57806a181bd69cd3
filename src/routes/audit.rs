use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::AuditEvent;
use crate::state::SharedState;

const MAX_PER_PAGE: i64 = 200;

#[derive(Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize)]
pub struct AuditPage {
    pub events: Vec<AuditEvent>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<PageParams>,
) -> Result<Json<AuditPage>, AppError> {
    auth.require_admin()?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(50).clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);

    let events = db::audit::list(&state.pool, per_page, offset).await?;
    let total = db::audit::count(&state.pool).await?;

    Ok(Json(AuditPage {
        events,
        total,
        page,
        per_page,
    }))
}
