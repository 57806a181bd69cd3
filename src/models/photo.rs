use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Photo metadata. The bytes are only loaded by the download route.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub record_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}
