use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct QualityRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub lot: String,
    pub guide: Option<String>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub verified_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One measurement in a record. Parameter name and range are copied at
/// write time so later parameter edits don't rewrite history.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ControlReading {
    pub id: Uuid,
    pub record_id: Uuid,
    pub parameter_id: Option<Uuid>,
    pub parameter_name: String,
    pub range_label: String,
    pub value: Option<f64>,
    pub text_value: Option<String>,
    pub observation: Option<String>,
    pub out_of_range: bool,
    pub alert: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RecordDetail {
    #[serde(flatten)]
    pub record: QualityRecord,
    pub out_of_range_count: usize,
    pub readings: Vec<ControlReading>,
}

impl RecordDetail {
    pub fn new(record: QualityRecord, readings: Vec<ControlReading>) -> Self {
        let out_of_range_count = readings.iter().filter(|r| r.out_of_range).count();
        Self {
            record,
            out_of_range_count,
            readings,
        }
    }
}
