use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::report::{ProductSummary, UserSummary};

/// Per-product totals for records inside `[from, until)`.
pub async fn product_summaries(
    pool: &PgPool,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<ProductSummary>, sqlx::Error> {
    sqlx::query_as::<_, ProductSummary>(
        "SELECT p.id, p.name, p.code,
                (SELECT COUNT(*) FROM parameters pa WHERE pa.product_id = p.id) AS parameter_count,
                COUNT(r.id) AS record_count,
                COALESCE(SUM(r.quantity), 0)::BIGINT AS total_quantity,
                COALESCE(SUM(cr.flagged), 0)::BIGINT AS out_of_range_count,
                MAX(r.recorded_at) AS last_recorded_at
         FROM products p
         LEFT JOIN quality_records r
                ON r.product_id = p.id
               AND ($1::timestamptz IS NULL OR r.recorded_at >= $1)
               AND ($2::timestamptz IS NULL OR r.recorded_at < $2)
         LEFT JOIN (
                SELECT record_id, COUNT(*) FILTER (WHERE out_of_range) AS flagged
                FROM control_readings GROUP BY record_id
              ) cr ON cr.record_id = r.id
         GROUP BY p.id
         ORDER BY p.name ASC",
    )
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Per-user record counts inside `[from, until)`.
pub async fn user_summaries(
    pool: &PgPool,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT u.id, u.email, u.name, u.role, u.active, u.two_factor_enabled, u.last_login_at,
                COUNT(r.id) AS record_count
         FROM users u
         LEFT JOIN quality_records r
                ON r.user_id = u.id
               AND ($1::timestamptz IS NULL OR r.recorded_at >= $1)
               AND ($2::timestamptz IS NULL OR r.recorded_at < $2)
         GROUP BY u.id
         ORDER BY u.name ASC",
    )
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}
