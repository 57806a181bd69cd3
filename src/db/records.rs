use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{ControlReading, QualityRecord};

pub struct NewRecord<'a> {
    pub product_id: Uuid,
    pub product_name: &'a str,
    pub user_id: Uuid,
    pub user_name: &'a str,
    pub lot: &'a str,
    pub guide: Option<&'a str>,
    pub quantity: i32,
    pub notes: Option<&'a str>,
    pub verified_by: Option<&'a str>,
}

pub struct NewReading {
    pub parameter_id: Uuid,
    pub parameter_name: String,
    pub range_label: String,
    pub value: Option<f64>,
    pub text_value: Option<String>,
    pub observation: Option<String>,
    pub out_of_range: bool,
    pub alert: Option<String>,
}

pub struct RecordHeader<'a> {
    pub lot: &'a str,
    pub guide: Option<&'a str>,
    pub quantity: i32,
    pub notes: Option<&'a str>,
    pub verified_by: Option<&'a str>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecordFilter {
    pub from: Option<DateTime<Utc>>,
    /// Exclusive.
    pub until: Option<DateTime<Utc>>,
    pub product_id: Option<Uuid>,
}

pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewRecord<'_>,
    readings: &[NewReading],
) -> Result<(QualityRecord, Vec<ControlReading>), sqlx::Error> {
    let created = sqlx::query_as::<_, QualityRecord>(
        "INSERT INTO quality_records
            (product_id, product_name, user_id, user_name, lot, guide, quantity, notes, verified_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(record.product_id)
    .bind(record.product_name)
    .bind(record.user_id)
    .bind(record.user_name)
    .bind(record.lot)
    .bind(record.guide)
    .bind(record.quantity)
    .bind(record.notes)
    .bind(record.verified_by)
    .fetch_one(&mut **tx)
    .await?;

    let mut stored = Vec::with_capacity(readings.len());
    for reading in readings {
        let row = sqlx::query_as::<_, ControlReading>(
            "INSERT INTO control_readings
                (record_id, parameter_id, parameter_name, range_label, value, text_value,
                 observation, out_of_range, alert)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(created.id)
        .bind(reading.parameter_id)
        .bind(&reading.parameter_name)
        .bind(&reading.range_label)
        .bind(reading.value)
        .bind(&reading.text_value)
        .bind(&reading.observation)
        .bind(reading.out_of_range)
        .bind(&reading.alert)
        .fetch_one(&mut **tx)
        .await?;
        stored.push(row);
    }

    Ok((created, stored))
}

pub async fn list(pool: &PgPool, filter: &RecordFilter) -> Result<Vec<QualityRecord>, sqlx::Error> {
    sqlx::query_as::<_, QualityRecord>(
        "SELECT * FROM quality_records
         WHERE ($1::timestamptz IS NULL OR recorded_at >= $1)
           AND ($2::timestamptz IS NULL OR recorded_at < $2)
           AND ($3::uuid IS NULL OR product_id = $3)
         ORDER BY recorded_at DESC",
    )
    .bind(filter.from)
    .bind(filter.until)
    .bind(filter.product_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<QualityRecord>, sqlx::Error> {
    sqlx::query_as::<_, QualityRecord>("SELECT * FROM quality_records WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn readings_for(pool: &PgPool, record_id: Uuid) -> Result<Vec<ControlReading>, sqlx::Error> {
    sqlx::query_as::<_, ControlReading>(
        "SELECT * FROM control_readings WHERE record_id = $1 ORDER BY created_at ASC, parameter_name ASC",
    )
    .bind(record_id)
    .fetch_all(pool)
    .await
}

/// Out-of-range reading counts keyed by record, for the records report.
pub async fn out_of_range_counts(
    pool: &PgPool,
    record_ids: &[Uuid],
) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT record_id, COUNT(*) FROM control_readings
         WHERE record_id = ANY($1) AND out_of_range
         GROUP BY record_id",
    )
    .bind(record_ids)
    .fetch_all(pool)
    .await
}

pub async fn update_header(
    pool: &PgPool,
    id: Uuid,
    header: &RecordHeader<'_>,
) -> Result<Option<QualityRecord>, sqlx::Error> {
    sqlx::query_as::<_, QualityRecord>(
        "UPDATE quality_records SET
            lot = $2, guide = $3, quantity = $4, notes = $5, verified_by = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(header.lot)
    .bind(header.guide)
    .bind(header.quantity)
    .bind(header.notes)
    .bind(header.verified_by)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quality_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
