use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const KIND_RANGE: &str = "range";
pub const KIND_TEXT: &str = "text";

/// A check performed on every lot of a product: either a numeric
/// `[min_value, max_value]` window or an expected text answer.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub kind: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: String,
    pub expected_text: Option<String>,
    pub range_label: String,
    pub created_at: DateTime<Utc>,
}

impl Parameter {
    pub fn is_range(&self) -> bool {
        self.kind == KIND_RANGE
    }
}
