use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Parameter;

/// Column values for insert and update; `range_label` is derived by the caller.
pub struct ParameterFields<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: &'a str,
    pub expected_text: Option<&'a str>,
    pub range_label: &'a str,
}

pub async fn create(
    pool: &PgPool,
    product_id: Uuid,
    fields: &ParameterFields<'_>,
) -> Result<Parameter, sqlx::Error> {
    sqlx::query_as::<_, Parameter>(
        "INSERT INTO parameters
            (product_id, name, kind, min_value, max_value, unit, expected_text, range_label)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(product_id)
    .bind(fields.name)
    .bind(fields.kind)
    .bind(fields.min_value)
    .bind(fields.max_value)
    .bind(fields.unit)
    .bind(fields.expected_text)
    .bind(fields.range_label)
    .fetch_one(pool)
    .await
}

pub async fn list_by_product<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    product_id: Uuid,
) -> Result<Vec<Parameter>, sqlx::Error> {
    sqlx::query_as::<_, Parameter>(
        "SELECT * FROM parameters WHERE product_id = $1 ORDER BY created_at ASC",
    )
    .bind(product_id)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Parameter>, sqlx::Error> {
    sqlx::query_as::<_, Parameter>("SELECT * FROM parameters WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    fields: &ParameterFields<'_>,
) -> Result<Option<Parameter>, sqlx::Error> {
    sqlx::query_as::<_, Parameter>(
        "UPDATE parameters SET
            name = $2, kind = $3, min_value = $4, max_value = $5,
            unit = $6, expected_text = $7, range_label = $8
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(fields.name)
    .bind(fields.kind)
    .bind(fields.min_value)
    .bind(fields.max_value)
    .bind(fields.unit)
    .bind(fields.expected_text)
    .bind(fields.range_label)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM parameters WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
