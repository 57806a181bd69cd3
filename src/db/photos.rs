use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Photo;

const METADATA_COLUMNS: &str =
    "id, record_id, file_name, content_type, size_bytes, sha256, created_at";

pub struct PhotoBlob {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub async fn create(
    pool: &PgPool,
    record_id: Uuid,
    file_name: &str,
    content_type: &str,
    sha256: &str,
    data: &[u8],
) -> Result<Photo, sqlx::Error> {
    let sql = format!(
        "INSERT INTO photos (record_id, file_name, content_type, size_bytes, sha256, data)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {METADATA_COLUMNS}"
    );
    sqlx::query_as::<_, Photo>(&sql)
        .bind(record_id)
        .bind(file_name)
        .bind(content_type)
        .bind(i64::try_from(data.len()).unwrap_or(i64::MAX))
        .bind(sha256)
        .bind(data)
        .fetch_one(pool)
        .await
}

pub async fn list_by_record(pool: &PgPool, record_id: Uuid) -> Result<Vec<Photo>, sqlx::Error> {
    let sql = format!(
        "SELECT {METADATA_COLUMNS} FROM photos WHERE record_id = $1 ORDER BY created_at ASC"
    );
    sqlx::query_as::<_, Photo>(&sql)
        .bind(record_id)
        .fetch_all(pool)
        .await
}

pub async fn find_blob(pool: &PgPool, id: Uuid) -> Result<Option<PhotoBlob>, sqlx::Error> {
    let row: Option<(String, String, Vec<u8>)> =
        sqlx::query_as("SELECT file_name, content_type, data FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(file_name, content_type, data)| PhotoBlob {
        file_name,
        content_type,
        data,
    }))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM photos WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Photo>, sqlx::Error> {
    let sql = format!("SELECT {METADATA_COLUMNS} FROM photos WHERE id = $1");
    sqlx::query_as::<_, Photo>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}
