use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::QualityRecord;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub parameter_count: i64,
    pub record_count: i64,
    pub total_quantity: i64,
    pub out_of_range_count: i64,
    pub last_recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    #[serde(flatten)]
    pub record: QualityRecord,
    pub out_of_range_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub active: bool,
    pub two_factor_enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub record_count: i64,
}
